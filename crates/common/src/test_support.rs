pub mod tests {
    use crate::settings::Settings;

    pub const TEST_PRIVATE_KEY: &str =
        "0xe8f32e723decf4051aefac8e2c93c9c5b214313817cdb01a1494b917c8436b35";
    pub const TEST_ADDRESS: &str = "0x056db290f8ba3250ca64a45d16284d04bc6f5fbf";
    /// A second identity, distinct from [`TEST_ADDRESS`].
    pub const OTHER_PRIVATE_KEY: &str =
        "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    pub fn crate_test_settings_str() -> String {
        format!(
            r#"
            [headers]
            address = "Toshi-ID-Address"
            signature = "Toshi-Signature"
            timestamp = "Toshi-Timestamp"

            [server]
            bind_address = "127.0.0.1:0"
            timestamp_tolerance_secs = 180
            max_body_bytes = 1048576

            [signing]
            private_key = "{}"
            "#,
            TEST_PRIVATE_KEY
        )
    }

    pub fn create_test_settings() -> Settings {
        let toml_str = crate_test_settings_str();
        Settings::from_toml(&toml_str).expect("Invalid config")
    }

    #[test]
    fn test_fixtures_agree() {
        use crate::request_signing::RequestSigner;

        let signer = RequestSigner::from_hex(TEST_PRIVATE_KEY).expect("fixture key");
        let other = RequestSigner::from_hex(OTHER_PRIVATE_KEY).expect("other fixture key");

        assert_eq!(signer.address().to_string(), TEST_ADDRESS);
        assert_ne!(other.address(), signer.address());
        assert_eq!(
            create_test_settings().signing.private_key.as_deref(),
            Some(TEST_PRIVATE_KEY)
        );
    }
}
