//! CSV input and output.
//!
//! Matrices are plain comma-separated numbers, one row per line. A first
//! line that does not parse as numbers is taken as a header and skipped.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context};
use ndarray::Array2;

use connectome_cluster::{BranchPath, Linkage};
use connectome_traverse::{HopHistogram, Trajectory};

/// Read a dense numeric matrix.
pub fn read_matrix_csv(path: &Path) -> anyhow::Result<Array2<f64>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let mut values = Vec::new();
    let mut n_cols = None;
    let mut n_rows = 0;

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parsed: Result<Vec<f64>, _> = line.split(',').map(|f| f.trim().parse::<f64>()).collect();
        let row = match parsed {
            Ok(row) => row,
            Err(_) if n_rows == 0 && n_cols.is_none() => {
                n_cols = Some(line.split(',').count());
                continue;
            }
            Err(e) => bail!("{}:{}: {e}", path.display(), lineno + 1),
        };

        match n_cols {
            Some(n) if n != row.len() => bail!(
                "{}:{}: expected {n} columns, found {}",
                path.display(),
                lineno + 1,
                row.len()
            ),
            _ => n_cols = Some(row.len()),
        }
        values.extend(row);
        n_rows += 1;
    }

    let n_cols = n_cols.unwrap_or(0);
    if n_rows == 0 {
        bail!("{} contains no data rows", path.display());
    }
    Array2::from_shape_vec((n_rows, n_cols), values)
        .with_context(|| format!("{} is not rectangular", path.display()))
}

/// `hop,node_0,…` with one row per hop `1..=max_hops`.
pub fn write_histogram_csv(path: &Path, histogram: &HopHistogram) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);

    write!(w, "hop")?;
    for v in 0..histogram.n_nodes() {
        write!(w, ",node_{v}")?;
    }
    writeln!(w)?;

    for (h, row) in histogram.counts().rows().into_iter().enumerate() {
        write!(w, "{}", h + 1)?;
        for c in row {
            write!(w, ",{c}")?;
        }
        writeln!(w)?;
    }
    w.flush()
}

/// `trial,source,outcome,steps,path` with the path space-separated.
pub fn write_paths_csv(path: &Path, trajectories: &[Trajectory]) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "trial,source,outcome,steps,path")?;

    for (i, t) in trajectories.iter().enumerate() {
        let nodes: Vec<String> = t.path().iter().map(usize::to_string).collect();
        writeln!(w, "{i},{},{},{},{}", t.source, t.outcome.label(), t.steps(), nodes.join(" "))?;
    }
    w.flush()
}

/// Feature matrix with a `f0,f1,…` header, readable by [`read_matrix_csv`].
pub fn write_matrix_csv(path: &Path, m: &Array2<f64>) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);

    let header: Vec<String> = (0..m.ncols()).map(|j| format!("f{j}")).collect();
    writeln!(w, "{}", header.join(","))?;
    for row in m.rows() {
        let fields: Vec<String> = row.iter().map(|v| format!("{v:.6}")).collect();
        writeln!(w, "{}", fields.join(","))?;
    }
    w.flush()
}

/// `sample,level_1,…,level_D,leaf`; `columns` as produced by
/// [`level_labels`](connectome_cluster::level_labels).
pub fn write_labels_csv(
    path: &Path,
    leaves: &[BranchPath],
    columns: &[Vec<BranchPath>],
) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);

    write!(w, "sample")?;
    for d in 1..=columns.len() {
        write!(w, ",level_{d}")?;
    }
    writeln!(w, ",leaf")?;

    for (i, leaf) in leaves.iter().enumerate() {
        write!(w, "{i}")?;
        for col in columns {
            write!(w, ",{}", col[i])?;
        }
        writeln!(w, ",{leaf}")?;
    }
    w.flush()
}

pub fn write_linkage_csv(path: &Path, linkage: &Linkage) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "left,right,distance,member_count")?;
    for r in &linkage.rows {
        writeln!(w, "{},{},{},{}", r.left, r.right, r.distance, r.member_count)?;
    }
    w.flush()
}

/// `leaf_id,label` in linkage leaf-id order.
pub fn write_leaf_order_csv(path: &Path, linkage: &Linkage) -> std::io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "leaf_id,label")?;
    for (id, label) in linkage.leaf_labels.iter().enumerate() {
        writeln!(w, "{id},{label}")?;
    }
    w.flush()
}
