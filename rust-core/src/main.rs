use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{info, warn};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tibi_core::config::{
    DEFAULT_BROADENING, DEFAULT_DOS_BINS, DEFAULT_DOS_POINTS, DEFAULT_GRID_DIVISIONS,
    DEFAULT_PATH_POINTS,
};
use tibi_core::lattice::{BrillouinZoneBuilder, LatticeBasis};
use tibi_core::model::{expand, HoppingRecord, NodeRef, Site, SupercellSpec, UnitCell};
use tibi_core::spectrum::{histogram, lorentzian, MeshSpec, Session, SolveRequest, Spectrum};
use tibi_core::{Dimension, MeshKind};

#[derive(Parser)]
#[command(name = "tibi")]
#[command(about = "Tight-binding band structures, densities of states and supercells")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Number of threads to use (default: all available cores)
    #[arg(short, long)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the Brillouin zone and its high symmetry points
    Zone {
        /// Model file (JSON)
        #[arg(short, long)]
        model: PathBuf,
    },
    /// Compute bands along a path through high symmetry points
    Bands {
        #[arg(short, long)]
        model: PathBuf,

        /// Comma separated point labels, e.g. "Γ,V1,E1,Γ" (default: every catalog point)
        #[arg(short, long)]
        path: Option<String>,

        /// Target number of k-points
        #[arg(short = 'n', long, default_value_t = DEFAULT_PATH_POINTS)]
        points: usize,

        /// Solve even if the hopping table is not Hermitian
        #[arg(long)]
        allow_non_hermitian: bool,
    },
    /// Compute the density of states on a k-point grid
    Dos {
        #[arg(short, long)]
        model: PathBuf,

        /// Grid divisions along the three reciprocal vectors
        #[arg(
            short,
            long,
            num_args = 3,
            default_values_t = [DEFAULT_GRID_DIVISIONS.0, DEFAULT_GRID_DIVISIONS.1, DEFAULT_GRID_DIVISIONS.2]
        )]
        grid: Vec<usize>,

        /// Use a Monkhorst-Pack grid instead of a Γ-centered one
        #[arg(long)]
        monkhorst_pack: bool,

        /// Number of histogram bins
        #[arg(short, long, default_value_t = DEFAULT_DOS_BINS)]
        bins: usize,

        /// Lorentzian-broadened curve instead of a histogram
        #[arg(long)]
        lorentzian: bool,

        /// Lorentzian broadening Γ
        #[arg(long, default_value_t = DEFAULT_BROADENING)]
        broadening: f64,

        /// Project onto the states of this site
        #[arg(long)]
        site: Option<usize>,

        #[arg(long)]
        allow_non_hermitian: bool,
    },
    /// Reduce the lattice basis and write the remapped model
    Reduce {
        #[arg(short, long)]
        model: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },
    /// Expand the model into a supercell
    Supercell {
        #[arg(short, long)]
        model: PathBuf,

        /// Multipliers n1 n2 n3
        #[arg(short = 'n', long, num_args = 3, required = true)]
        multipliers: Vec<i64>,

        #[arg(short, long)]
        output: PathBuf,
    },
}

// ======================== MODEL FILE ========================

#[derive(Debug, Serialize, Deserialize)]
struct SiteFile {
    name: String,
    #[serde(default)]
    fractional: [f64; 3],
    states: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ModelFile {
    name: String,
    /// Number of periodic directions
    dimension: usize,
    /// Basis vectors a1, a2, a3
    basis: [[f64; 3]; 3],
    sites: Vec<SiteFile>,
    #[serde(default)]
    hoppings: Vec<HoppingRecord>,
}

impl ModelFile {
    fn into_unit_cell(self) -> Result<UnitCell> {
        let [a1, a2, a3] = self.basis.map(Vector3::from);
        let dimension = Dimension::from_count(self.dimension)?;
        let basis = LatticeBasis::from_base_vectors(a1, a2, a3, dimension)
            .context("basis vectors do not fit the requested dimensionality")?;
        let sites = self
            .sites
            .into_iter()
            .map(|site| Site::new(site.name, site.fractional).with_states(site.states))
            .collect();
        Ok(UnitCell::from_parts(self.name, basis, sites, self.hoppings)?)
    }

    fn from_unit_cell(cell: &UnitCell) -> Self {
        let vectors = cell.basis().base_vectors();
        Self {
            name: cell.name.clone(),
            dimension: cell.basis().dimension().periodic_count(),
            basis: vectors.map(|v| [v.x, v.y, v.z]),
            sites: cell
                .sites()
                .iter()
                .map(|site| SiteFile {
                    name: site.name.clone(),
                    fractional: site.fractional,
                    states: site.states.iter().map(|s| s.name.clone()).collect(),
                })
                .collect(),
            hoppings: cell.hoppings().to_records(),
        }
    }
}

fn load_model(path: &Path) -> Result<UnitCell> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file: ModelFile =
        serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))?;
    file.into_unit_cell()
        .with_context(|| format!("invalid model in {}", path.display()))
}

fn write_model(path: &Path, cell: &UnitCell) -> Result<()> {
    let text = serde_json::to_string_pretty(&ModelFile::from_unit_cell(cell))?;
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}

// ======================== ENTRY POINT ========================

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Set thread pool size if specified
    if let Some(threads) = cli.threads {
        #[cfg(feature = "parallel")]
        {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
                .context("failed to set thread pool size")?;
            info!("Using {} threads", threads);
        }
        #[cfg(not(feature = "parallel"))]
        {
            warn!(
                "Thread count {} specified but parallel feature not enabled. Ignoring.",
                threads
            );
        }
    }

    info!("Starting tibi v{}", tibi_core::VERSION);

    match cli.command {
        Commands::Zone { model } => print_zone(&load_model(&model)?),
        Commands::Bands {
            model,
            path,
            points,
            allow_non_hermitian,
        } => {
            let cell = load_model(&model)?;
            refuse_non_hermitian(&cell, allow_non_hermitian)?;
            run_bands(cell, path.as_deref(), points)
        }
        Commands::Dos {
            model,
            grid,
            monkhorst_pack,
            bins,
            lorentzian,
            broadening,
            site,
            allow_non_hermitian,
        } => {
            let cell = load_model(&model)?;
            refuse_non_hermitian(&cell, allow_non_hermitian)?;
            let kind = if monkhorst_pack {
                MeshKind::MonkhorstPack
            } else {
                MeshKind::GammaCentered
            };
            let [n1, n2, n3] = three_values(&grid, "--grid")?;
            let spec = MeshSpec::new(kind, n1, n2, n3);
            run_dos(cell, spec, bins, lorentzian.then_some(broadening), site)
        }
        Commands::Reduce { model, output } => {
            let reduced = load_model(&model)?.reduce().context("lattice reduction failed")?;
            write_model(&output, &reduced)
        }
        Commands::Supercell {
            model,
            multipliers,
            output,
        } => {
            let cell = load_model(&model)?;
            let [n1, n2, n3] = three_values(&multipliers, "--multipliers")?;
            let spec = SupercellSpec::new(n1, n2, n3);
            let supercell = expand(&cell, &spec).context("supercell expansion failed")?;
            write_model(&output, &supercell)
        }
    }
}

// Exactly three values for a per-axis flag; repeated flags accumulate
fn three_values<T: Copy>(values: &[T], flag: &str) -> Result<[T; 3]> {
    match values {
        &[a, b, c] => Ok([a, b, c]),
        _ => bail!("{} takes exactly 3 values, got {}", flag, values.len()),
    }
}

fn refuse_non_hermitian(cell: &UnitCell, allow: bool) -> Result<()> {
    let warnings = cell.hermiticity_check();
    if warnings.is_empty() {
        return Ok(());
    }
    if allow {
        warn!("solving a non-Hermitian model ({} warnings)", warnings.len());
        return Ok(());
    }
    bail!(
        "the hopping table is not Hermitian ({} warnings); fix the model or pass --allow-non-hermitian",
        warnings.len()
    )
}

fn print_zone(cell: &UnitCell) -> Result<()> {
    let zone = BrillouinZoneBuilder::new(cell.basis()).build()?;
    let reciprocal = zone.reciprocal_basis();
    for axis in 0..cell.basis().dimension().periodic_count() {
        let b = reciprocal.column(axis);
        println!("b{} = [{:.6}, {:.6}, {:.6}]", axis + 1, b[0], b[1], b[2]);
    }
    println!("measure = {:.6}", zone.polytope().measure());
    for vertex in zone.polytope().vertices() {
        println!("vertex [{:.6}, {:.6}, {:.6}]", vertex.x, vertex.y, vertex.z);
    }
    for point in zone.high_symmetry_points() {
        let p = point.position;
        println!("{:<4} {:?} [{:.6}, {:.6}, {:.6}]", point.label, point.kind, p.x, p.y, p.z);
    }
    Ok(())
}

// Submit a solve and log its progress until it completes
fn solve_in_background(cell: UnitCell, request: SolveRequest) -> Result<Spectrum> {
    let mut session = Session::new(cell);
    session.submit(request)?;
    let mut reported = 0;
    while session.is_busy() {
        if let Some(progress) = session.latest_progress() {
            let percent = 100 * progress.completed / progress.total.max(1);
            if percent >= reported + 10 {
                info!("{}/{} k-points", progress.completed, progress.total);
                reported = percent;
            }
        }
        thread::sleep(Duration::from_millis(50));
    }
    Ok(session.wait()?)
}

fn run_bands(cell: UnitCell, labels: Option<&str>, points: usize) -> Result<()> {
    let zone = BrillouinZoneBuilder::new(cell.basis()).build()?;
    let labels: Vec<String> = match labels {
        Some(list) => list.split(',').map(|s| s.trim().to_string()).collect(),
        None => zone.high_symmetry_points().iter().map(|p| p.label.clone()).collect(),
    };
    let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();
    let path = zone.path(&label_refs, points)?;
    info!("band path through {} with {} points", labels.join("-"), path.len());

    let spectrum = solve_in_background(cell, SolveRequest::Path(path.clone()))?;
    if !spectrum.failed_points().is_empty() {
        warn!("{} path points failed and are printed as NaN", spectrum.failed_points().len());
    }
    for row in band_rows(&path.arc_lengths(), &spectrum)? {
        println!("{}", row);
    }
    Ok(())
}

// One row per k-point: arc length, then every band (NaN where the point failed)
fn band_rows(arc_lengths: &[f64], spectrum: &Spectrum) -> Result<Vec<String>> {
    let bands = (0..spectrum.state_count())
        .map(|n| spectrum.band(n))
        .collect::<tibi_core::Result<Vec<_>>>()?;
    Ok(arc_lengths
        .iter()
        .enumerate()
        .map(|(index, arc_length)| {
            let mut row = format!("{:.6}", arc_length);
            for band in &bands {
                row.push_str(&format!(" {:.6}", band[index]));
            }
            row
        })
        .collect())
}

fn run_dos(
    cell: UnitCell,
    spec: MeshSpec,
    bins: usize,
    broadening: Option<f64>,
    site: Option<usize>,
) -> Result<()> {
    let subset = match site {
        Some(index) => Some(cell.state_indices(&NodeRef::Site(index))?),
        None => None,
    };
    let spectrum = solve_in_background(cell, SolveRequest::Grid(spec))?;
    if !spectrum.failed_points().is_empty() {
        warn!("{} grid points failed and are left out", spectrum.failed_points().len());
    }

    let energies = spectrum.all_eigenvalues();
    let weights = subset.map(|s| spectrum.projection_weights(&s)).transpose()?;
    let curve = match broadening {
        Some(gamma) => lorentzian(&energies, DEFAULT_DOS_POINTS, gamma, weights.as_deref())?,
        None => histogram(&energies, bins, weights.as_deref())?.to_curve(),
    };
    for (energy, value) in curve.energies.iter().zip(&curve.values) {
        println!("{:.6} {:.6}", energy, value);
    }
    Ok(())
}
