//! `closetrack tag` — reconciliation tag utilities.

use clap::Subcommand;

use closetrack_engine::ReconTag;

use crate::CliError;

#[derive(Subcommand)]
pub enum TagCommands {
    /// Print the reconciliation tag for an account with embedding instructions
    #[command(after_help = "\
Examples:
  closetrack tag generate --period 1 --account 1000
  closetrack tag generate --period 3 --account 2100-B")]
    Generate {
        /// Period the account belongs to
        #[arg(long)]
        period: u32,

        /// Account number
        #[arg(long)]
        account: String,
    },
}

pub fn cmd_tag(cmd: TagCommands) -> Result<(), CliError> {
    match cmd {
        TagCommands::Generate { period, account } => {
            let tag = ReconTag::generate(period, &account).map_err(CliError::from_engine)?;
            println!("{tag}");
            eprintln!(
                "Put this tag in any cell of your supporting document and the \
                 reconciled amount in the cell directly to its left. The tag may \
                 be embedded in other text; the amount cell must hold only the number."
            );
            Ok(())
        }
    }
}
