//! Command Line Interface for the tick vault.
use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tick_vault_core::config::{DEFAULT_TICK_WIDTH, VaultConfig};
use tick_vault_core::engine::EngineContext;
use tick_vault_core::position::centered_range;
use tick_vault_domain::TokenAmounts;
use tick_vault_domain::math::tick_to_price;
use tick_vault_simulation::price_path::{DeterministicTickPath, GaussianTickWalk};
use tick_vault_simulation::runner::{SimulationConfig, SimulationSummary, VaultSimulation};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tick-vault")]
#[command(about = "Auto-centering concentrated liquidity vault", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the range a vault would center on a tick
    Range {
        /// Tick to center on
        #[arg(long, allow_hyphen_values = true)]
        tick: i32,

        /// Half-width in tick spacings
        #[arg(short, long, default_value_t = DEFAULT_TICK_WIDTH)]
        width: u32,

        /// Pool tick spacing
        #[arg(short, long, default_value_t = 60)]
        spacing: i32,
    },
    /// Walk through two deposits, a rebalance and the exits
    Scenario {
        /// Half-width in tick spacings
        #[arg(
            short,
            long,
            env = "TICK_VAULT_DEFAULT_TICK_WIDTH",
            default_value_t = DEFAULT_TICK_WIDTH
        )]
        tick_width: u32,
    },
    /// Run the vault against a random price walk
    Simulate {
        /// Number of swaps
        #[arg(long, default_value_t = 500)]
        steps: usize,

        /// Random seed
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Standard deviation of the tick move per swap
        #[arg(long, default_value_t = 150.0)]
        volatility: f64,

        /// Mean tick move per swap
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        drift: f64,

        /// Half-width in tick spacings
        #[arg(
            short,
            long,
            env = "TICK_VAULT_DEFAULT_TICK_WIDTH",
            default_value_t = DEFAULT_TICK_WIDTH
        )]
        tick_width: u32,

        /// Number of depositors
        #[arg(long, default_value_t = 3)]
        depositors: usize,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Range {
            tick,
            width,
            spacing,
        } => {
            let range = centered_range(tick, width, spacing)?;
            println!("Tick {} (price {:.6})", tick, tick_to_price(tick)?);
            println!(
                "Range [{}, {})  prices [{:.6}, {:.6})",
                range.lower,
                range.upper,
                tick_to_price(range.lower)?,
                tick_to_price(range.upper)?
            );
        }
        Commands::Scenario { tick_width } => run_scenario(tick_width)?,
        Commands::Simulate {
            steps,
            seed,
            volatility,
            drift,
            tick_width,
            depositors,
            json,
        } => {
            let config = SimulationConfig {
                vault: VaultConfig::default().with_default_tick_width(tick_width),
                depositors,
                ..SimulationConfig::default()
            };
            info!(steps, seed, volatility, tick_width, "Starting simulation");

            let mut sim = VaultSimulation::new(config)?;
            let mut walk = GaussianTickWalk::new(sim.config.initial_tick, drift, volatility, seed)?;
            let summary = sim.run(&mut walk, steps)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
            if !summary.in_sync {
                bail!("vault books drifted from the engine");
            }
        }
    }

    Ok(())
}

fn run_scenario(tick_width: u32) -> Result<()> {
    let config = SimulationConfig {
        vault: VaultConfig::default().with_default_tick_width(tick_width),
        depositors: 2,
        ..SimulationConfig::default()
    };
    let mut sim = VaultSimulation::new(config)?;
    let mut depositors = VaultSimulation::depositors(2);
    let (Some(alice), Some(bob)) = (depositors.next(), depositors.next()) else {
        bail!("scenario needs two depositors");
    };

    let position = sim.vault.position(&sim.pool)?.clone();
    println!(
        "Registered at tick 0, range [{}, {})",
        position.range.lower, position.range.upper
    );

    for (name, actor, amount) in [("A", alice, 1_000_000u128), ("B", bob, 500_000u128)] {
        let outcome = sim.vault.deposit(
            &mut sim.engine,
            actor,
            &sim.pool,
            TokenAmounts::new(amount, amount),
            TokenAmounts::zero(),
        )?;
        println!(
            "{} deposits {}/{} -> liquidity {}, shares {}",
            name, outcome.amounts.amount0, outcome.amounts.amount1, outcome.liquidity, outcome.shares
        );
    }

    let target = 7000;
    if !sim.swap_to(target) {
        bail!("swap to tick {target} was rejected");
    }
    let position = sim.vault.position(&sim.pool)?.clone();
    println!(
        "Price moved to tick {}, range re-centered to [{}, {})",
        sim.engine.slot0(&sim.pool)?.tick,
        position.range.lower,
        position.range.upper
    );

    for (name, actor) in [("A", alice), ("B", bob)] {
        let shares = sim.vault.shares_of(&sim.pool, &actor)?;
        let outcome = sim.vault.withdraw(
            &mut sim.engine,
            actor,
            &sim.pool,
            shares,
            TokenAmounts::zero(),
        )?;
        println!(
            "{} redeems {} shares -> liquidity {}, tokens {}/{}",
            name, shares, outcome.liquidity, outcome.amounts.amount0, outcome.amounts.amount1
        );
    }

    let report = sim.vault.reconcile(&sim.engine)?;
    println!(
        "Remaining liquidity {}, books in sync: {}",
        sim.vault.position(&sim.pool)?.liquidity,
        report.is_in_sync()
    );
    println!("{}", sim.vault.events().to_json()?);

    // Replaying the same moves through the runner gives the same picture.
    let mut replay = VaultSimulation::new(sim.config.clone())?;
    let summary = replay.run(
        &mut DeterministicTickPath {
            ticks: vec![0, target],
        },
        1,
    )?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &SimulationSummary) {
    println!("{:<22} | {:>24}", "Metric", "Value");
    println!("{}", "-".repeat(49));
    println!("{:<22} | {:>24}", "Steps", summary.steps);
    println!("{:<22} | {:>24}", "Swaps", summary.swaps);
    println!("{:<22} | {:>24}", "Rejected swaps", summary.rejected_swaps);
    println!("{:<22} | {:>24}", "Rebalances", summary.rebalances);
    println!("{:<22} | {:>24}", "Deposits", summary.deposits);
    println!("{:<22} | {:>24}", "Withdrawals", summary.withdrawals);
    println!("{:<22} | {:>24}", "Final tick", summary.final_tick);
    println!("{:<22} | {:>24.6}", "Final price", summary.final_price);
    println!(
        "{:<22} | {:>24}",
        "Final range",
        format!("[{}, {})", summary.final_range.lower, summary.final_range.upper)
    );
    println!("{:<22} | {:>24}", "Residual liquidity", summary.residual_liquidity);
    println!(
        "{:<22} | {:>24}",
        "Deposited (0/1)",
        format!("{}/{}", summary.deposited.amount0, summary.deposited.amount1)
    );
    println!(
        "{:<22} | {:>24}",
        "Withdrawn (0/1)",
        format!("{}/{}", summary.withdrawn.amount0, summary.withdrawn.amount1)
    );
    println!("{:<22} | {:>24}", "Books in sync", summary.in_sync);
}
