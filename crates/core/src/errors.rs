use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("menu key `{0}` must be non-empty, trimmed and lowercase")]
    InvalidMenuKey(String),
    #[error("menu key `{0}` appears more than once in the catalog")]
    DuplicateMenuKey(String),
    #[error("menu item `{key}` has a negative price")]
    NegativePrice { key: String },
    #[error("menu catalog must contain at least one item")]
    EmptyCatalog,
}

#[cfg(test)]
mod tests {
    use crate::errors::DomainError;

    #[test]
    fn messages_name_the_offending_key() {
        let error = DomainError::NegativePrice { key: "soda".to_owned() };
        assert_eq!(error.to_string(), "menu item `soda` has a negative price");

        let error = DomainError::DuplicateMenuKey("burger".to_owned());
        assert!(error.to_string().contains("`burger`"));
    }
}
