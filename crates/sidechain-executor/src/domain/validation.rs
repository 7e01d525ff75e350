//! # Name and payload validation
//!
//! Contract names matching `[A-Za-z0-9_]+` at deploy time,
//! and `[A-Za-z_]+` for table names created under them.

/// `true` iff every character is an ASCII letter, digit, or underscore, and
/// the string is non-empty — the deploy-time contract-name rule.
pub fn is_valid_contract_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// `true` iff every character is an ASCII letter or underscore, and the
/// string is non-empty — `db.createTable`'s name rule.
pub fn is_valid_table_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphabetic() || b == b'_')
}

/// Build the fully-qualified table name `<contract>_<table>`.
pub fn qualified_table_name(contract: &str, table: &str) -> String {
    format!("{contract}_{table}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_names_allow_digits() {
        assert!(is_valid_contract_name("tok_v2"));
        assert!(!is_valid_contract_name("tok-v2"));
        assert!(!is_valid_contract_name(""));
    }

    #[test]
    fn table_names_reject_digits() {
        assert!(is_valid_table_name("balances"));
        assert!(!is_valid_table_name("balances2"));
    }

    #[test]
    fn qualified_name_joins_with_underscore() {
        assert_eq!(qualified_table_name("tok", "balances"), "tok_balances");
    }
}
