//! schemes command - List handled URI schemes

use serde::Serialize;
use sp_core::Provision;

use crate::exit_code::ExitCode;
use crate::output::Formatter;

#[derive(Debug, Serialize)]
struct SchemesOutput {
    schemes: Vec<String>,
}

impl std::fmt::Display for SchemesOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.schemes.join("\n"))
    }
}

/// Execute the schemes command
pub fn execute(provision: &impl Provision, formatter: &Formatter) -> ExitCode {
    let output = SchemesOutput {
        schemes: provision.schemes_handled().into_iter().collect(),
    };
    formatter.output(&output);
    ExitCode::Success
}
