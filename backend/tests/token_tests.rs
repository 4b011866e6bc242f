use account_service::{LegacyTokenGenerator, SecureTokenGenerator, TokenGenerator, TokenStrategy};
use std::collections::HashSet;

#[test]
fn test_legacy_tokens_are_31_bit_integers() {
    let generator = LegacyTokenGenerator;

    for _ in 0..1_000 {
        let value: i64 = generator.generate().parse().unwrap();
        assert!((0..i32::MAX as i64).contains(&value));
    }
}

#[test]
fn test_secure_tokens_are_128_bit_hex() {
    let generator = SecureTokenGenerator;
    let mut seen = HashSet::new();

    for _ in 0..1_000 {
        let token = generator.generate();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(seen.insert(token), "secure tokens must not repeat");
    }
}

#[test]
fn test_token_strategy_parsing() {
    assert_eq!("secure".parse::<TokenStrategy>().unwrap(), TokenStrategy::Secure);
    assert_eq!("LEGACY".parse::<TokenStrategy>().unwrap(), TokenStrategy::Legacy);
    assert!("jwt".parse::<TokenStrategy>().is_err());
    assert_eq!(TokenStrategy::default(), TokenStrategy::Secure);
}

#[test]
fn test_token_strategy_selects_generator() {
    let legacy = TokenStrategy::Legacy.generator().generate();
    let secure = TokenStrategy::Secure.generator().generate();

    assert!(legacy.parse::<i32>().is_ok());
    assert_eq!(secure.len(), 32);
}
