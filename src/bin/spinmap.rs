use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use spinmap::config::{Parcellation, SpinConfig, SurfaceName};
use spinmap::epicentre::{combined_epicentre, epicentre_mapping};
use spinmap::io::{
    read_brain_map, read_connectome, read_epicentre_json, read_surface, spin_json,
    write_epicentre_json, write_similarity_json, write_spin_json, write_store_json, write_vector,
};
use spinmap::logging::{init_tracing, log_line, warn_line};
use spinmap::results::{ResultKey, cohort_spin_tests};
use spinmap::similarity::{pairwise_similarity, significance_fraction};
use spinmap::spin::spatial_correlation;
use spinmap::types::{Matrix, Sidedness};

#[derive(Parser)]
#[command(name = "spinmap")]
#[command(about = "Spin-permutation spatial correlation and epicentre mapping", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct SpinArgs {
    #[arg(long, default_value = "fsa5")]
    surface: String,
    #[arg(long, default_value = "aparc")]
    parcellation: String,
    /// Sphere coordinates table (region, hemisphere, x, y, z)
    #[arg(long, required = true)]
    surface_file: PathBuf,
    #[arg(long, default_value_t = 5000)]
    n_rot: usize,
    #[arg(long)]
    one_sided: bool,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    parallel: bool,
    #[arg(long)]
    cores: Option<usize>,
    #[arg(long)]
    no_null: bool,
}

#[derive(Subcommand)]
enum Command {
    Spin {
        #[arg(long, required = true)]
        map1: PathBuf,
        #[arg(long, required = true)]
        map2: PathBuf,
        #[command(flatten)]
        spin: SpinArgs,
        #[arg(long, required = true)]
        output: PathBuf,
        #[arg(long)]
        log_name: Option<PathBuf>,
    },
    Epicentre {
        #[arg(long, required = true)]
        reference: PathBuf,
        #[arg(long, required = true)]
        connectome: PathBuf,
        /// Subcortical-seed connectome appended after the cortical seeds
        #[arg(long)]
        subcortical: Option<PathBuf>,
        #[command(flatten)]
        spin: SpinArgs,
        #[arg(long, required = true)]
        output: PathBuf,
        #[arg(long)]
        log_name: Option<PathBuf>,
    },
    /// Spin-test maps keyed by cohort and hemisphere against one reference map
    Cohorts {
        #[arg(long, required = true)]
        reference: PathBuf,
        #[arg(long, required = true, num_args = 1..)]
        maps: Vec<PathBuf>,
        /// Comma-separated cohort:hemisphere keys, one per map (e.g. tle:L,tle:R)
        #[arg(long, required = true)]
        keys: String,
        #[command(flatten)]
        spin: SpinArgs,
        #[arg(long, required = true)]
        output: PathBuf,
        #[arg(long)]
        log_name: Option<PathBuf>,
    },
    Similarity {
        #[arg(long, required = true, num_args = 1..)]
        maps: Vec<PathBuf>,
        #[arg(long)]
        names: Option<String>,
        #[command(flatten)]
        spin: SpinArgs,
        #[arg(long, required = true)]
        output: PathBuf,
        #[arg(long)]
        log_name: Option<PathBuf>,
    },
    Consistency {
        #[arg(long, required = true, num_args = 1..)]
        epicentres: Vec<PathBuf>,
        #[arg(long, default_value_t = 0.05)]
        alpha: f64,
        #[arg(long, required = true)]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Spin {
            map1,
            map2,
            spin,
            output,
            log_name,
        } => {
            let mut log = open_log(log_name.as_deref())?;
            let (config, surface) = load_spin_setup(&spin)?;
            let x = read_brain_map(&map1)?;
            let y = read_brain_map(&map2)?;
            let result = spatial_correlation(&x.values, &y.values, &surface, &config)?;
            log_line(
                log.as_mut(),
                &format!(
                    "Correlation: r = {}, p = {} ({} rotations, seed {:?})",
                    result.r, result.p, result.rotation_count, result.seed
                ),
                true,
            )?;
            if result.identity_rotations > 0 {
                warn_line(
                    log.as_mut(),
                    &format!(
                        "{} rotations reproduced the original map",
                        result.identity_rotations
                    ),
                )?;
            }
            write_spin_json(&result, &output)?;
        }
        Command::Epicentre {
            reference,
            connectome,
            subcortical,
            spin,
            output,
            log_name,
        } => {
            let mut log = open_log(log_name.as_deref())?;
            let (config, surface) = load_spin_setup(&spin)?;
            let reference = read_brain_map(&reference)?;
            let cortical = read_connectome(&connectome)?;
            let result = match subcortical {
                Some(path) => {
                    let subcortical = read_connectome(&path)?;
                    combined_epicentre(&reference, &cortical, &subcortical, &surface, &config)?
                }
                None => epicentre_mapping(&reference, &cortical, &surface, &config)?,
            };
            for (seed, (r, p)) in result.seeds.iter().zip(result.r.iter().zip(&result.p)) {
                log_line(log.as_mut(), &format!("{seed}: r = {r}, p = {p}"), false)?;
            }
            let significant = result.p.iter().filter(|p| **p < 0.05).count();
            log_line(
                log.as_mut(),
                &format!("{significant} of {} seeds with p < 0.05", result.len()),
                true,
            )?;
            write_epicentre_json(&result, &output)?;
        }
        Command::Cohorts {
            reference,
            maps,
            keys,
            spin,
            output,
            log_name,
        } => {
            let mut log = open_log(log_name.as_deref())?;
            let (config, surface) = load_spin_setup(&spin)?;
            let keys = split_string_list(keys)
                .iter()
                .map(|k| k.parse::<ResultKey>())
                .collect::<Result<Vec<_>, _>>()?;
            if keys.len() != maps.len() {
                return Err(anyhow::anyhow!(
                    "{} keys given for {} maps",
                    keys.len(),
                    maps.len()
                ));
            }
            let reference = read_brain_map(&reference)?;
            let mut keyed = Vec::with_capacity(maps.len());
            for (key, path) in keys.into_iter().zip(&maps) {
                keyed.push((key, read_brain_map(path)?.values));
            }
            let store = cohort_spin_tests(&keyed, &reference.values, &surface, &config, None)?;
            for (key, result) in store.iter() {
                log_line(
                    log.as_mut(),
                    &format!("{key}: r = {}, p = {}", result.r, result.p),
                    true,
                )?;
            }
            write_store_json(&store, spin_json, &output)?;
        }
        Command::Similarity {
            maps,
            names,
            spin,
            output,
            log_name,
        } => {
            let mut log = open_log(log_name.as_deref())?;
            let (config, surface) = load_spin_setup(&spin)?;
            let names = match names {
                Some(list) => split_string_list(list),
                None => maps.iter().map(|p| file_stem(p.as_path())).collect(),
            };
            if names.len() != maps.len() {
                return Err(anyhow::anyhow!(
                    "{} names given for {} maps",
                    names.len(),
                    maps.len()
                ));
            }
            let mut named = Vec::with_capacity(maps.len());
            for (name, path) in names.into_iter().zip(&maps) {
                named.push((name, read_brain_map(path)?));
            }
            let matrix = pairwise_similarity(&named, &surface, &config, None)?;
            log_line(
                log.as_mut(),
                &format!("Compared {} maps pairwise", matrix.row_labels.len()),
                true,
            )?;
            write_similarity_json(&matrix, &output)?;
        }
        Command::Consistency {
            epicentres,
            alpha,
            output,
        } => {
            let mut p_maps: Matrix = Vec::with_capacity(epicentres.len());
            for path in &epicentres {
                p_maps.push(read_epicentre_json(path)?.p);
            }
            let fraction = significance_fraction(&p_maps, alpha)?;
            write_vector(&fraction, &output)?;
        }
    }

    Ok(())
}

fn load_spin_setup(args: &SpinArgs) -> anyhow::Result<(SpinConfig, spinmap::SurfaceDescriptor)> {
    let surface_name: SurfaceName = args.surface.parse()?;
    let parcellation: Parcellation = args.parcellation.parse()?;
    let config = SpinConfig {
        rotation_count: args.n_rot,
        surface: surface_name,
        parcellation,
        sidedness: if args.one_sided {
            Sidedness::OneSided
        } else {
            Sidedness::TwoSided
        },
        seed: args.seed,
        keep_null: !args.no_null,
        parallel: args.parallel,
        cores: args.cores,
    };
    config.validate()?;
    let surface = read_surface(&args.surface_file, surface_name, parcellation)
        .with_context(|| format!("load surface {}", args.surface_file.display()))?;
    Ok((config, surface))
}

fn open_log(path: Option<&Path>) -> anyhow::Result<Option<File>> {
    path.map(|p| File::create(p).with_context(|| format!("create log {}", p.display())))
        .transpose()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("map")
        .to_string()
}

fn split_string_list(input: String) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
