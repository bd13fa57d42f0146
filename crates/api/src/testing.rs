//! Fixtures shared by unit tests.

use shared::jwt::JwtConfig;

pub const TEST_PRIVATE_KEY: &str = include_str!("../tests/fixtures/jwt_private.pem");
pub const TEST_PUBLIC_KEY: &str = include_str!("../tests/fixtures/jwt_public.pem");

/// RS256 signer over the fixture key pair.
pub fn jwt_config() -> JwtConfig {
    JwtConfig::new(TEST_PRIVATE_KEY, TEST_PUBLIC_KEY, 3600, 172800)
        .expect("fixture keys are valid")
}
