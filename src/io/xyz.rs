//! (Extended) XYZ reader.
//!
//! Each frame is an atom-count line, a comment line and one `element x y z` line per
//! atom. Element tokens may be symbols in any case, symbols with a numeric site
//! suffix (`Pt1`), or atomic numbers. A `Lattice="ax ay az bx by bz cx cy cz"`
//! entry in the comment line sets the cell.

use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::OnceLock;

use nalgebra::Vector3;
use regex::Regex;

use crate::core::chemistry;
use crate::core::domain::{Atom, AtomicStructure, Cell};
use crate::error::{FingerprintError, Result};

fn lattice_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"Lattice\s*=\s*"([^"]*)""#).expect("static regex"))
}

fn label_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z]{1,2})\d*$").expect("static regex"))
}

pub fn parse_element(token: &str) -> Option<u8> {
    if let Ok(num) = token.parse::<u8>() {
        return (num > 0 && chemistry::symbol(num).is_some()).then_some(num);
    }
    let caps = label_regex().captures(token)?;
    chemistry::atomic_number(&caps[1])
}

fn parse_lattice(comment: &str) -> Option<std::result::Result<Cell, String>> {
    let caps = lattice_regex().captures(comment)?;
    let values: std::result::Result<Vec<f64>, _> =
        caps[1].split_whitespace().map(str::parse::<f64>).collect();
    Some(match values {
        Ok(v) if v.len() == 9 => Ok(Cell::new(
            Vector3::new(v[0], v[1], v[2]),
            Vector3::new(v[3], v[4], v[5]),
            Vector3::new(v[6], v[7], v[8]),
        )),
        Ok(v) => Err(format!("Lattice needs 9 values, got {}", v.len())),
        Err(e) => Err(format!("Invalid Lattice value: {}", e)),
    })
}

/// Reads every frame from `reader`. `source_name` only labels errors.
pub fn read_frames<R: BufRead>(reader: R, source_name: &str) -> Result<Vec<AtomicStructure>> {
    let err = |details: String| FingerprintError::Xyz {
        source_name: source_name.to_string(),
        details,
    };

    let mut lines = reader.lines().enumerate();
    let mut frames = Vec::new();

    loop {
        // Skip blank lines between frames.
        let (line_no, count_line) = loop {
            match lines.next() {
                None => return Ok(frames),
                Some((i, line)) => {
                    let line = line.map_err(|e| err(format!("Error reading line {}: {}", i + 1, e)))?;
                    if !line.trim().is_empty() {
                        break (i + 1, line);
                    }
                }
            }
        };

        let num_atoms: usize = count_line
            .trim()
            .parse()
            .map_err(|_| err(format!("Line {}: invalid number of atoms: {}", line_no, count_line)))?;

        let comment = match lines.next() {
            Some((i, line)) => line.map_err(|e| err(format!("Error reading line {}: {}", i + 1, e)))?,
            None => return Err(err(format!("Line {}: missing comment line", line_no + 1))),
        };

        let mut atoms = Vec::with_capacity(num_atoms);
        for _ in 0..num_atoms {
            let (i, line) = lines
                .next()
                .ok_or_else(|| err(format!("Expected {} atoms, got {}", num_atoms, atoms.len())))?;
            let line = line.map_err(|e| err(format!("Error reading line {}: {}", i + 1, e)))?;
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 4 {
                return Err(err(format!(
                    "Line {}: expected at least 4 fields, got {}",
                    i + 1,
                    parts.len()
                )));
            }

            let number = parse_element(parts[0])
                .ok_or_else(|| err(format!("Line {}: unknown element: {}", i + 1, parts[0])))?;
            let mut xyz = [0.0; 3];
            for (k, axis) in ["x", "y", "z"].iter().enumerate() {
                xyz[k] = parts[k + 1].parse().map_err(|_| {
                    err(format!("Line {}: invalid {} coordinate: {}", i + 1, axis, parts[k + 1]))
                })?;
            }
            atoms.push(Atom::new(number, xyz[0], xyz[1], xyz[2]));
        }

        let mut structure = AtomicStructure::new(atoms);
        if let Some(cell) = parse_lattice(&comment) {
            structure.cell = cell.map_err(err)?;
        }
        let comment = comment.trim();
        if !comment.is_empty() {
            structure
                .info
                .data
                .insert("comment".to_string(), serde_json::Value::from(comment));
        }
        frames.push(structure);
    }
}

/// Reads all frames from a file, or from standard input when `input` is `-`.
pub fn read_file(input: &str) -> Result<Vec<AtomicStructure>> {
    if input == "-" {
        return read_frames(BufReader::new(io::stdin()), "<stdin>");
    }
    let file = std::fs::File::open(input).map_err(|e| FingerprintError::Io {
        path: PathBuf::from(input),
        source: e,
    })?;
    read_frames(BufReader::new(file), input)
}

/// Serializes one frame as plain XYZ (symbols, 8 decimals).
pub fn write_frame(structure: &AtomicStructure, comment: &str) -> String {
    let mut s = String::with_capacity(64 * (structure.len() + 2));
    s.push_str(&format!("{}\n{}\n", structure.len(), comment));
    for atom in &structure.atoms {
        let sym = chemistry::symbol(atom.number).unwrap_or("X");
        let p = atom.position;
        s.push_str(&format!("{:<3} {:.8} {:.8} {:.8}\n", sym, p.x, p.y, p.z));
    }
    s
}
