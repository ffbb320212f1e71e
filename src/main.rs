use std::path::PathBuf;

use clap::{Parser, Subcommand};

use greasecoin::address::Address;
use greasecoin::host::{HostError, StateFile};
use greasecoin::ledger::{Amount, TokenCall, TokenLedger};

#[derive(Parser)]
#[command(name = "gcn", version, about = "Fixed-supply token ledger with delegated allowances")]
struct Cli {
    /// Path to the JSON ledger state file.
    #[arg(long, global = true, default_value = "ledger.json")]
    state: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the ledger and credit the full supply to the creator.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value_t = 18)]
        decimals: u8,
        #[arg(long)]
        supply: Amount,
        #[arg(long)]
        creator: Address,
    },
    /// Move tokens from the caller's balance.
    Transfer {
        #[arg(long)]
        caller: Address,
        #[arg(long)]
        to: Address,
        #[arg(long)]
        amount: Amount,
    },
    /// Set (overwrite) the caller's spending limit for a spender.
    Approve {
        #[arg(long)]
        caller: Address,
        #[arg(long)]
        spender: Address,
        #[arg(long)]
        amount: Amount,
    },
    /// Spend from another account within the caller's allowance.
    TransferFrom {
        #[arg(long)]
        caller: Address,
        #[arg(long)]
        from: Address,
        #[arg(long)]
        to: Address,
        #[arg(long)]
        amount: Amount,
    },
    /// Print an account's balance.
    Balance { account: Address },
    /// Print the limit an owner granted a spender.
    Allowance { owner: Address, spender: Address },
    /// Print token metadata and total supply.
    Info,
    /// Print the emitted events as JSON lines, oldest first.
    Events,
    /// Print the sha256 root over balances and allowances.
    Root,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(2);
    }
}

fn run(cli: Cli) -> Result<(), HostError> {
    let state = StateFile::new(cli.state);
    match cli.command {
        Command::Create {
            name,
            symbol,
            decimals,
            supply,
            creator,
        } => {
            if state.exists() {
                return Err(HostError::AlreadyInitialized(state.path().to_path_buf()));
            }
            let ledger = TokenLedger::new(name, symbol, decimals, supply, creator);
            state.store(&ledger)?;
            println!(
                "{} ({}) created: {} base units credited to {}",
                ledger.name(),
                ledger.symbol(),
                ledger.total_supply(),
                creator
            );
        }
        Command::Transfer { caller, to, amount } => {
            state.commit(&TokenCall::Transfer { caller, to, amount })?;
            println!("transferred {amount}: {caller} → {to}");
        }
        Command::Approve {
            caller,
            spender,
            amount,
        } => {
            state.commit(&TokenCall::Approve {
                caller,
                spender,
                amount,
            })?;
            println!("approved {spender} to spend {amount} of {caller}");
        }
        Command::TransferFrom {
            caller,
            from,
            to,
            amount,
        } => {
            state.commit(&TokenCall::TransferFrom {
                caller,
                from,
                to,
                amount,
            })?;
            println!("transferred {amount}: {from} → {to} (by {caller})");
        }
        Command::Balance { account } => {
            let ledger = state.load()?;
            println!("{}", ledger.balance_of(account));
        }
        Command::Allowance { owner, spender } => {
            let ledger = state.load()?;
            println!("{}", ledger.allowance(owner, spender));
        }
        Command::Info => {
            let ledger = state.load()?;
            println!("name:         {}", ledger.name());
            println!("symbol:       {}", ledger.symbol());
            println!("decimals:     {}", ledger.decimals());
            println!("total supply: {}", ledger.total_supply());
        }
        Command::Events => {
            let ledger = state.load()?;
            for event in ledger.events() {
                println!("{}", serde_json::to_string(event)?);
            }
        }
        Command::Root => {
            let ledger = state.load()?;
            println!("{}", hex::encode(ledger.snapshot().state_root));
        }
    }
    Ok(())
}
