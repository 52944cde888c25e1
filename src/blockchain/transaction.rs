use serde::{Deserialize, Serialize};

use super::crypto::Address;

/// A value transfer between two addresses.
///
/// The serialized form of this struct is the canonical transaction encoding:
/// exactly these three fields, in declaration order, under the JSON names
/// below. Wallets sign these bytes and the chain re-derives them during
/// verification, so any change here is a wire-format change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The sender's address
    #[serde(rename = "sender_blockchain_address")]
    pub sender: Address,

    /// The recipient's address
    #[serde(rename = "receiver_blockchain_address")]
    pub recipient: Address,

    /// Amount being transferred
    pub value: f64,
}

impl Transaction {
    /// Creates a new transaction
    pub fn new(sender: Address, recipient: Address, value: f64) -> Self {
        Transaction {
            sender,
            recipient,
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transaction() {
        let transaction = Transaction::new(
            Address("alice".to_string()),
            Address("bob".to_string()),
            2.0,
        );

        assert_eq!(transaction.sender.0, "alice");
        assert_eq!(transaction.recipient.0, "bob");
        assert_eq!(transaction.value, 2.0);
    }

    #[test]
    fn test_wire_field_names() {
        let transaction = Transaction::new(
            Address("alice".to_string()),
            Address("bob".to_string()),
            2.0,
        );

        let json = serde_json::to_value(&transaction).unwrap();
        assert_eq!(json["sender_blockchain_address"], "alice");
        assert_eq!(json["receiver_blockchain_address"], "bob");
        assert_eq!(json["value"], 2.0);
    }
}
