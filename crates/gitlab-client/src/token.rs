//! Capability interface for host-supplied tokens

/// Supplies the token of the currently authenticated session, if any.
///
/// When a provider yields a token at client construction time it overrides
/// the statically configured one, letting the host's identity system drive
/// which credentials the client uses without coupling the client to any
/// particular authentication framework.
pub trait TokenProvider {
    fn current_token(&self) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider(Option<String>);

    impl TokenProvider for FixedProvider {
        fn current_token(&self) -> Option<String> {
            self.0.clone()
        }
    }

    #[test]
    fn test_provider_is_object_safe() {
        let present: &dyn TokenProvider = &FixedProvider(Some("session".into()));
        let absent: &dyn TokenProvider = &FixedProvider(None);

        assert_eq!(present.current_token().as_deref(), Some("session"));
        assert_eq!(absent.current_token(), None);
    }
}
