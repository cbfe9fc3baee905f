mod run;

use clap::Subcommand;
use saga_engine::OrchestratorConfig;

use crate::error::Result;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Launch a campaign through the saga
    Run(run::RunArgs),
}

impl Commands {
    pub(crate) fn execute(self, config: OrchestratorConfig) -> Result<()> {
        match self {
            Self::Run(args) => run::run(args, config),
        }
    }
}
