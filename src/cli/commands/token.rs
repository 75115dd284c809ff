use clap::Args;
use serde_json::json;

use crate::auth::{generate_token, Claims};
use crate::cli::{utils, OutputFormat};

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[arg(long, help = "Token subject")]
    pub subject: String,

    #[arg(long = "role", help = "Role granted by the token (repeatable)")]
    pub roles: Vec<String>,
}

pub fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let claims = Claims::new(args.subject, args.roles);
    let token = match generate_token(&claims) {
        Ok(token) => token,
        Err(e) => {
            utils::output_error(&output_format, &e.to_string(), Some("TOKEN_FAILED"))?;
            return Err(e.into());
        }
    };

    match output_format {
        OutputFormat::Json => utils::output_success(
            &output_format,
            "Token issued",
            Some(json!({ "token": token, "expires_at": claims.exp })),
        ),
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}
