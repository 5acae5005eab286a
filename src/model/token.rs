/// An API token and whether this run created it.
///
/// Only owned tokens are revoked on teardown; a token handed in through
/// config or flags belongs to the operator and is left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    value: String,
    owned: bool,
}

impl AuthToken {
    pub fn supplied(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            owned: false,
        }
    }

    pub fn acquired(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            owned: true,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_owned(&self) -> bool {
        self.owned
    }
}
