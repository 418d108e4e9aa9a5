//! Post-decode validation hooks.
//!
//! A `Validator<T>` sees the decoded value after transport and decoding have
//! both succeeded and may still reject it. Rejections surface as
//! `RequestError::Validation` carrying the validator's message.

/// Business-rule check applied to a decoded response.
pub trait Validator<T: ?Sized>: Send + Sync {
    fn validate(&self, value: &T) -> Result<(), String>;
}

/// Accepts every decoded value.
///
/// This is the policy `RequestClient::request` applies. It performs no
/// checks; deployments that need business rules pass their own validator to
/// `RequestClient::request_validated`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl<T: ?Sized> Validator<T> for AcceptAll {
    fn validate(&self, _value: &T) -> Result<(), String> {
        Ok(())
    }
}

/// Boolean predicate with a fixed rejection message.
pub struct Predicate<F> {
    message: String,
    check: F,
}

impl<F> Predicate<F> {
    pub fn new(message: impl Into<String>, check: F) -> Self {
        Self {
            message: message.into(),
            check,
        }
    }
}

impl<T, F> Validator<T> for Predicate<F>
where
    T: ?Sized,
    F: Fn(&T) -> bool + Send + Sync,
{
    fn validate(&self, value: &T) -> Result<(), String> {
        if (self.check)(value) {
            Ok(())
        } else {
            Err(self.message.clone())
        }
    }
}

impl<T, F> Validator<T> for F
where
    T: ?Sized,
    F: Fn(&T) -> Result<(), String> + Send + Sync,
{
    fn validate(&self, value: &T) -> Result<(), String> {
        self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_all_accepts() {
        assert!(AcceptAll.validate(&vec![1, 2, 3]).is_ok());
        assert!(Validator::<str>::validate(&AcceptAll, "anything").is_ok());
    }

    #[test]
    fn predicate_rejects_with_message() {
        let non_empty = Predicate::new("expected at least one item", |v: &Vec<u32>| !v.is_empty());
        assert!(non_empty.validate(&vec![1]).is_ok());
        assert_eq!(non_empty.validate(&Vec::new()), Err("expected at least one item".to_string()));
    }

    #[test]
    fn closure_validator() {
        let positive = |v: &i64| if *v > 0 { Ok(()) } else { Err(format!("{v} is not positive")) };
        assert!(positive.validate(&4).is_ok());
        assert_eq!(positive.validate(&-1), Err("-1 is not positive".to_string()));
    }
}
