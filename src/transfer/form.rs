//! Transfer draft and its validation rules
//!
//! Rules, in order:
//! 1. source and destination resolve to known accounts (id >= 1)
//! 2. amount >= 0.01
//! 3. description has at least 3 characters
//! 4. source != destination, reported on the destination field and only
//!    checked once 1-3 hold

use rust_decimal::Decimal;
use validator::Validate;

use super::error::{
    AMOUNT_TOO_SMALL, DESTINATION_REQUIRED, FieldErrors, SAME_ACCOUNT, SOURCE_REQUIRED,
    TransferField,
};
use crate::models::{Account, AccountId, TransferRequest};

/// Smallest transferable amount (one cent)
pub const MIN_AMOUNT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Form contents as edited by the user
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct TransferDraft {
    #[validate(range(min = 1, message = "Source account is required"))]
    pub from_account_id: AccountId,

    #[validate(range(min = 1, message = "Destination account is required"))]
    pub to_account_id: AccountId,

    pub amount: Decimal,

    #[validate(length(min = 3, message = "Description must be at least 3 characters"))]
    pub description: String,
}

impl TransferDraft {
    /// Defaults: first account as source, second as destination (0 when absent)
    pub fn for_accounts(accounts: &[Account]) -> Self {
        Self {
            from_account_id: accounts.first().map_or(0, |a| a.id),
            to_account_id: accounts.get(1).map_or(0, |a| a.id),
            amount: Decimal::ZERO,
            description: String::new(),
        }
    }

    /// Check every rule and build the request body
    pub fn validate_for(&self, accounts: &[Account]) -> Result<TransferRequest, FieldErrors> {
        let mut errors = FieldErrors::new();

        if let Err(report) = self.validate() {
            for (name, field_errors) in report.field_errors() {
                let Some(field) = TransferField::from_struct_field(&name) else {
                    continue;
                };
                let message = field_errors
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| field.default_message().to_string());
                errors.add(field, message);
            }
        }

        let known = |id: AccountId| accounts.iter().any(|a| a.id == id);
        if !known(self.from_account_id) {
            errors.add(TransferField::FromAccount, SOURCE_REQUIRED);
        }
        if !known(self.to_account_id) {
            errors.add(TransferField::ToAccount, DESTINATION_REQUIRED);
        }

        if self.amount < MIN_AMOUNT {
            errors.add(TransferField::Amount, AMOUNT_TOO_SMALL);
        }

        if errors.is_empty() && self.from_account_id == self.to_account_id {
            errors.add(TransferField::ToAccount, SAME_ACCOUNT);
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(TransferRequest {
            from_account_id: self.from_account_id,
            to_account_id: self.to_account_id,
            amount: self.amount,
            description: self.description.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;
    use crate::transfer::error::DESCRIPTION_TOO_SHORT;

    fn accounts() -> Vec<Account> {
        vec![fixtures::account(1, 1000), fixtures::account(2, 5000)]
    }

    fn valid_draft() -> TransferDraft {
        TransferDraft {
            from_account_id: 1,
            to_account_id: 2,
            amount: Decimal::from(100),
            description: "Test transfer".to_string(),
        }
    }

    #[test]
    fn test_min_amount_constant() {
        assert_eq!(MIN_AMOUNT, Decimal::new(1, 2));
        assert_eq!(MIN_AMOUNT.to_string(), "0.01");
    }

    #[test]
    fn test_defaults_follow_account_order() {
        let draft = TransferDraft::for_accounts(&accounts());
        assert_eq!(draft.from_account_id, 1);
        assert_eq!(draft.to_account_id, 2);
        assert_eq!(draft.amount, Decimal::ZERO);

        let single = TransferDraft::for_accounts(&accounts()[..1]);
        assert_eq!(single.to_account_id, 0);

        let none = TransferDraft::for_accounts(&[]);
        assert_eq!(none.from_account_id, 0);
    }

    #[test]
    fn test_valid_draft_builds_request() {
        let req = valid_draft().validate_for(&accounts()).unwrap();
        assert_eq!(req.from_account_id, 1);
        assert_eq!(req.to_account_id, 2);
        assert_eq!(req.amount, Decimal::from(100));
        assert_eq!(req.description, "Test transfer");
    }

    #[test]
    fn test_amount_boundary() {
        let mut draft = valid_draft();
        draft.amount = Decimal::ZERO;
        let errors = draft.validate_for(&accounts()).unwrap_err();
        assert_eq!(errors.get(TransferField::Amount), Some(AMOUNT_TOO_SMALL));

        draft.amount = Decimal::new(1, 2);
        assert!(draft.validate_for(&accounts()).is_ok());

        draft.amount = Decimal::new(9, 3);
        assert!(draft.validate_for(&accounts()).is_err());
    }

    #[test]
    fn test_description_boundary() {
        let mut draft = valid_draft();
        draft.description = "ab".to_string();
        let errors = draft.validate_for(&accounts()).unwrap_err();
        assert_eq!(
            errors.get(TransferField::Description),
            Some(DESCRIPTION_TOO_SHORT)
        );

        draft.description = "abc".to_string();
        assert!(draft.validate_for(&accounts()).is_ok());
    }

    #[test]
    fn test_same_account_flags_destination() {
        let mut draft = valid_draft();
        draft.to_account_id = 1;
        let errors = draft.validate_for(&accounts()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get(TransferField::ToAccount), Some(SAME_ACCOUNT));
        assert!(!errors.contains(TransferField::FromAccount));
    }

    #[test]
    fn test_same_account_checked_last() {
        let mut draft = valid_draft();
        draft.to_account_id = 1;
        draft.amount = Decimal::ZERO;
        let errors = draft.validate_for(&accounts()).unwrap_err();
        // Other failures hide the cross-field rule
        assert!(errors.contains(TransferField::Amount));
        assert!(!errors.contains(TransferField::ToAccount));
    }

    #[test]
    fn test_unknown_and_missing_accounts() {
        let mut draft = valid_draft();
        draft.from_account_id = 0;
        draft.to_account_id = 99;
        let errors = draft.validate_for(&accounts()).unwrap_err();
        assert_eq!(errors.get(TransferField::FromAccount), Some(SOURCE_REQUIRED));
        assert_eq!(
            errors.get(TransferField::ToAccount),
            Some(DESTINATION_REQUIRED)
        );
    }

    #[test]
    fn test_all_fields_reported_together() {
        let draft = TransferDraft::for_accounts(&[]);
        let errors = draft.validate_for(&[]).unwrap_err();
        assert_eq!(errors.len(), 4);
    }
}
