use log::info;
use onvif_wsse::{envelope, template, UsernameToken};
use std::fs;

/// Credentials for the token; the password is never echoed back.
const USERNAME_LABEL: &str = "ONVIF_USERNAME";
const PASSWORD_LABEL: &str = "ONVIF_PASSWORD";
/// Optional fixed nonce/timestamp for reproducible output
const NONCE_LABEL: &str = "ONVIF_NONCE";
const CREATED_LABEL: &str = "ONVIF_CREATED";
/// Operation to invoke when printing a complete envelope
const OPERATION_LABEL: &str = "ONVIF_OPERATION";
/// When set, fill this envelope template instead of printing one
const TEMPLATE_FILE_LABEL: &str = "TEMPLATE_FILE";
const OUTPUT_FILE_LABEL: &str = "OUTPUT_FILE";

const DEFAULT_USERNAME: &str = "admin";
const DEFAULT_PASSWORD: &str = "admin";
const DEFAULT_OPERATION: &str = "GetCapabilities";

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    env_logger::try_init()?;

    let username = std::env::var(USERNAME_LABEL).unwrap_or_else(|_| DEFAULT_USERNAME.to_string());
    let password = std::env::var(PASSWORD_LABEL).unwrap_or_else(|_| DEFAULT_PASSWORD.to_string());
    let nonce = std::env::var(NONCE_LABEL).unwrap_or_else(|_| UsernameToken::generate_nonce());
    let created =
        std::env::var(CREATED_LABEL).unwrap_or_else(|_| UsernameToken::generate_created());
    let token = UsernameToken::generate_token(&username, &password, &nonce, &created)?;
    info!("main - generated token for {}", token.username);

    match std::env::var(TEMPLATE_FILE_LABEL) {
        Ok(template_file) => {
            let output_file = std::env::var(OUTPUT_FILE_LABEL).map_err(|_| {
                format!(
                    "{} must be set when {} is given",
                    OUTPUT_FILE_LABEL, TEMPLATE_FILE_LABEL
                )
            })?;
            let contents = fs::read_to_string(&template_file)?;
            fs::write(&output_file, template::fill_template(&contents, &token))?;
            println!("Generated authenticated SOAP request: {}", output_file);
            println!("  Username: {}", token.username);
            println!("  Nonce: {}", token.nonce);
            println!("  Created: {}", token.created);
            println!("  Digest: {}", token.digest);
        }
        Err(_) => {
            let operation =
                std::env::var(OPERATION_LABEL).unwrap_or_else(|_| DEFAULT_OPERATION.to_string());
            // GetCapabilities is the probe the reference generator sends.
            let args: &[(&str, &str)] = if operation == DEFAULT_OPERATION {
                &[("Category", "All")]
            } else {
                &[]
            };
            println!("{}", envelope::build_envelope(&token, &operation, args));
        }
    }
    Ok(())
}
