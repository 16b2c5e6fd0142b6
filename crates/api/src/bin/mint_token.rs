//! Mint an admin access token for the configured `JWT_SECRET`.
//!
//! ```text
//! mint-token <subject> [role]
//! ```

use idioms_api::auth::jwt::{generate_access_token, JwtConfig, ROLE_ADMIN};

fn main() {
    dotenvy::dotenv().ok();

    let mut args = std::env::args().skip(1);
    let Some(subject) = args.next() else {
        eprintln!("usage: mint-token <subject> [role]");
        std::process::exit(2);
    };
    let role = args.next().unwrap_or_else(|| ROLE_ADMIN.to_string());

    let config = JwtConfig::from_env();
    match generate_access_token(&subject, &role, &config) {
        Ok(token) => println!("{token}"),
        Err(e) => {
            eprintln!("failed to sign token: {e}");
            std::process::exit(1);
        }
    }
}
