use clap::Args;
use serde_json::json;

use crate::app;
use crate::cli::{utils, OutputFormat};
use crate::predicate::{PredicateCompiler, PredicateWhere};

#[derive(Args, Debug)]
pub struct PredicateArgs {
    #[arg(help = "Resource name, e.g. participant-demographic")]
    pub resource: String,

    #[arg(help = "Lambda expression, e.g. 'x => x.NhsNumber == 9000000009'")]
    pub expression: String,
}

pub fn handle(args: PredicateArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let Some(descriptor) = app::descriptor_for(&args.resource) else {
        let known: Vec<&str> = app::descriptors().iter().map(|d| d.resource).collect();
        let message = format!("Unknown resource '{}' (known: {})", args.resource, known.join(", "));
        utils::output_error(&output_format, &message, Some("UNKNOWN_RESOURCE"))?;
        anyhow::bail!(message);
    };

    let predicate = match PredicateCompiler::new(descriptor).compile(&args.expression) {
        Ok(predicate) => predicate,
        Err(e) => {
            utils::output_error(&output_format, &e.to_string(), Some("INVALID_PREDICATE"))?;
            anyhow::bail!(e);
        }
    };

    let sql = PredicateWhere::generate(&predicate, 0);
    let params: Vec<String> = sql.params.iter().map(|p| p.to_string()).collect();

    match output_format {
        OutputFormat::Json => utils::output_success(
            &output_format,
            "Predicate compiled",
            Some(json!({ "table": descriptor.table, "where": sql.query, "params": params })),
        ),
        OutputFormat::Text => {
            println!("SELECT * FROM \"{}\" WHERE {}", descriptor.table, sql.query);
            for (i, param) in params.iter().enumerate() {
                println!("  ${} = {}", i + 1, param);
            }
            Ok(())
        }
    }
}
