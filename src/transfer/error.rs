//! Transfer form errors
//!
//! Validation failures are scoped to a form field and block submission;
//! they never reach the network.

use std::collections::BTreeMap;
use std::fmt;

// === Field messages ===
pub const SOURCE_REQUIRED: &str = "Source account is required";
pub const DESTINATION_REQUIRED: &str = "Destination account is required";
pub const AMOUNT_TOO_SMALL: &str = "Amount must be greater than 0";
pub const DESCRIPTION_TOO_SHORT: &str = "Description must be at least 3 characters";
pub const SAME_ACCOUNT: &str = "Source and destination accounts must be different";

/// Shown when a rejected transfer carries no structured message
pub const TRANSFER_FAILED: &str = "Transfer failed. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransferField {
    FromAccount,
    ToAccount,
    Amount,
    Description,
}

impl TransferField {
    /// Form field name as exposed to the caller
    pub fn name(&self) -> &'static str {
        match self {
            TransferField::FromAccount => "fromAccountId",
            TransferField::ToAccount => "toAccountId",
            TransferField::Amount => "amount",
            TransferField::Description => "description",
        }
    }

    /// Map a struct field name reported by `validator`
    pub(crate) fn from_struct_field(name: &str) -> Option<Self> {
        match name {
            "from_account_id" => Some(TransferField::FromAccount),
            "to_account_id" => Some(TransferField::ToAccount),
            "amount" => Some(TransferField::Amount),
            "description" => Some(TransferField::Description),
            _ => None,
        }
    }

    pub(crate) fn default_message(&self) -> &'static str {
        match self {
            TransferField::FromAccount => SOURCE_REQUIRED,
            TransferField::ToAccount => DESTINATION_REQUIRED,
            TransferField::Amount => AMOUNT_TOO_SMALL,
            TransferField::Description => DESCRIPTION_TOO_SHORT,
        }
    }
}

impl fmt::Display for TransferField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One message per invalid field; the first failing rule wins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<TransferField, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` unless the field already has one
    pub fn add(&mut self, field: TransferField, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: TransferField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: TransferField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TransferField, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}
