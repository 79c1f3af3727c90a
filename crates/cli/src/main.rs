mod problem;
mod provenance;

use std::fs::File;
use std::path::Path;

use adapted::api::{
    adapted_wasserstein, coin_toss_tree, flatten, flatten_standard, path_cost, possible_limit,
    pull_up_children, small_experiment, standard_filtration, terminal_cost, DepthPolicy,
    DistanceCfg, DistanceComputer, ExperimentTree, FiltrationTree, FormulationCfg,
    MarginalEncoding, MirrorMass, ProcessError,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use polars::prelude::*;
use serde_json::json;
use tracing_subscriber::fmt::SubscriberBuilder;

use problem::{Problem, SolveReport};
use provenance::{ensure_parent, write_sidecar, Payload};

#[derive(Parser)]
#[command(name = "cli")]
#[command(about = "Adapted Wasserstein distances between filtered processes")]
struct Cmd {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Solve a JSON problem file and write the coupling as JSON
    Solve {
        #[arg(long)]
        input: String,
        #[arg(long)]
        out: String,
        #[arg(long, value_enum, default_value_t = Marginals::OneSided)]
        marginals: Marginals,
        #[arg(long, value_enum, default_value_t = Mirror::OwnSide)]
        mirror: Mirror,
        /// Fail instead of iterating to the source height when heights differ
        #[arg(long)]
        require_equal_depth: bool,
    },
    /// Small experiment vs. its possible limit for d = 2^-n, n < levels (CSV or Parquet)
    Sweep {
        #[arg(long, default_value_t = 6)]
        levels: u32,
        #[arg(long)]
        out: String,
    },
    /// Distance between two coin-toss processes, terminal-value cost
    Coin {
        #[arg(long, default_value_t = 2)]
        depth: usize,
        #[arg(long, default_value_t = 0.5)]
        p1: f64,
        #[arg(long, default_value_t = 0.5)]
        p2: f64,
        /// Pull up the first split of the target filtration
        #[arg(long)]
        pull_first: bool,
    },
    /// Print a coin-toss filtration as Graphviz DOT
    Dot {
        #[arg(long, default_value_t = 2)]
        depth: usize,
        #[arg(long)]
        pull_first: bool,
    },
    /// Print a small provenance JSON block
    Report,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Marginals {
    OneSided,
    Equality,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mirror {
    OwnSide,
    Reference,
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Solve {
            input,
            out,
            marginals,
            mirror,
            require_equal_depth,
        } => {
            let formulation = formulation(marginals, mirror, require_equal_depth);
            solve(&input, &out, formulation).map(|_| ())
        }
        Action::Sweep { levels, out } => sweep(levels, &out).map(|_| ()),
        Action::Coin {
            depth,
            p1,
            p2,
            pull_first,
        } => coin(depth, p1, p2, pull_first),
        Action::Dot { depth, pull_first } => {
            print!("{}", coin_filtration(&coin_toss_tree(depth, 0.5), pull_first)?.to_dot());
            Ok(())
        }
        Action::Report => report(),
    }
}

fn formulation(marginals: Marginals, mirror: Mirror, require_equal_depth: bool) -> FormulationCfg {
    FormulationCfg {
        marginals: match marginals {
            Marginals::OneSided => MarginalEncoding::OneSided,
            Marginals::Equality => MarginalEncoding::Equality,
        },
        mirror_mass: match mirror {
            Mirror::OwnSide => MirrorMass::OwnSide,
            Mirror::Reference => MirrorMass::Reference,
        },
        depth: if require_equal_depth {
            DepthPolicy::RequireEqual
        } else {
            DepthPolicy::SourceHeight
        },
    }
}

fn solve(input: &str, out: &str, formulation: FormulationCfg) -> Result<SolveReport> {
    tracing::info!(input, out, ?formulation, "solve");
    let problem = Problem::load(input)?;
    let (p1, p2) = problem.processes()?;
    let cost = problem.cost_matrix()?;
    let computer = DistanceComputer::new(DistanceCfg {
        formulation,
        ..DistanceCfg::default()
    });
    let result = computer.compute(&p1, &p2, &cost)?;
    let report = SolveReport::from(&result);

    let out_path = Path::new(out);
    ensure_parent(out_path)?;
    std::fs::write(out_path, serde_json::to_vec_pretty(&report)?)
        .with_context(|| format!("writing {out}"))?;
    write_sidecar(
        out_path,
        Payload::new(
            "solve",
            json!({
                "input": input,
                "formulation": format!("{formulation:?}"),
                "n1": p1.len(),
                "n2": p2.len()
            }),
        ),
    )?;
    Ok(report)
}

/// Rows `(n, eps, d_standard, d_pulled)` for the small experiment against the
/// possible limit, once with its standard filtration and once pulled up.
fn sweep(levels: u32, out: &str) -> Result<DataFrame> {
    tracing::info!(levels, out, "sweep");
    let limit = possible_limit();
    let limit_std = flatten_standard(&limit)?;
    let limit_pulled = flatten(&limit, coin_filtration(&limit, true)?)?;

    let mut ns = Vec::new();
    let mut eps = Vec::new();
    let mut d_standard = Vec::new();
    let mut d_pulled = Vec::new();
    for n in 0..levels {
        let d = 0.5f64.powi(n as i32);
        let x = flatten_standard(&small_experiment(d))?;
        let cost = path_cost(&x.paths, &limit_std.paths);
        let std_res = adapted_wasserstein(&x.process, &limit_std.process, &cost)?;
        let pulled_res = adapted_wasserstein(&x.process, &limit_pulled.process, &cost)?;
        tracing::info!(n, d, d_standard = std_res.distance, d_pulled = pulled_res.distance, "level");
        ns.push(n);
        eps.push(d);
        d_standard.push(std_res.distance);
        d_pulled.push(pulled_res.distance);
    }
    let mut df = df!(
        "n" => ns,
        "eps" => eps,
        "d_standard" => d_standard,
        "d_pulled" => d_pulled
    )?;

    let out_path = Path::new(out);
    ensure_parent(out_path)?;
    let file = File::create(out_path).with_context(|| format!("creating {out}"))?;
    if out.ends_with(".parquet") {
        ParquetWriter::new(file).finish(&mut df)?;
    } else {
        CsvWriter::new(file).include_header(true).finish(&mut df)?;
    }
    write_sidecar(out_path, Payload::new("sweep", json!({ "levels": levels })))?;
    Ok(df)
}

fn coin(depth: usize, p1: f64, p2: f64, pull_first: bool) -> Result<()> {
    let source = flatten_standard(&coin_toss_tree(depth, p1))?;
    let target_tree = coin_toss_tree(depth, p2);
    let target = flatten(&target_tree, coin_filtration(&target_tree, pull_first)?)?;
    let cost = terminal_cost(&source.paths, &target.paths);
    let res = adapted_wasserstein(&source.process, &target.process, &cost)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "depth": depth,
            "p1": p1,
            "p2": p2,
            "pull_first": pull_first,
            "distance": res.distance,
            "rows": res.constraints.rows,
            "nnz": res.constraints.nnz,
            "iterations": res.solve.iterations
        }))?
    );
    Ok(())
}

/// Standard filtration of `tree`, optionally with the first child of the root
/// pulled up.
fn coin_filtration(tree: &ExperimentTree, pull_first: bool) -> Result<FiltrationTree, ProcessError> {
    let f = standard_filtration(tree);
    match f.node(f.root()).children.first() {
        Some(&first) if pull_first => pull_up_children(&f, first),
        _ => Ok(f),
    }
}

fn report() -> Result<()> {
    let obj = json!({
        "code_rev": provenance::current_git_rev(),
        "lib_version": adapted::VERSION,
        "params": {},
        "outputs": []
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}
