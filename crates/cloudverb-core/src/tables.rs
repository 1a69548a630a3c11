//! Response curves for knob-to-parameter scaling
//!
//! Linear knob travel is a poor fit for frequencies, gains and times. Each
//! [`Curve`] maps a normalized `[0, 1]` control value onto an exponential
//! response that also spans exactly `[0, 1]`, which the controller then
//! scales into engineering units.
//!
//! Octave curves rise by a fixed number of doublings across the travel;
//! decade curves by a fixed number of powers of ten. All tables are built
//! once on first use and shared read-only afterwards.

use std::sync::OnceLock;

/// Entries per response table
pub const TABLE_SIZE: usize = 40001;

/// Bias added before truncating a lookup index so values sitting exactly
/// on a table step land on it
const INDEX_EPSILON: f32 = 1e-3;

/// Response curve applied to a normalized control value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curve {
    /// Identity mapping, no table
    Linear,
    Oct2,
    Oct3,
    Oct4,
    Oct5,
    Oct6,
    Dec2,
    Dec3,
    Dec4,
}

impl Curve {
    /// All table-backed curves
    pub const TABLES: [Curve; 8] = [
        Curve::Oct2,
        Curve::Oct3,
        Curve::Oct4,
        Curve::Oct5,
        Curve::Oct6,
        Curve::Dec2,
        Curve::Dec3,
        Curve::Dec4,
    ];

    /// Index into the table bank, `None` for the linear curve
    fn slot(self) -> Option<usize> {
        match self {
            Curve::Linear => None,
            Curve::Oct2 => Some(0),
            Curve::Oct3 => Some(1),
            Curve::Oct4 => Some(2),
            Curve::Oct5 => Some(3),
            Curve::Oct6 => Some(4),
            Curve::Dec2 => Some(5),
            Curve::Dec3 => Some(6),
            Curve::Dec4 => Some(7),
        }
    }

    /// Unnormalized response at `x` in `[0, 1]`
    fn shape(self, x: f64) -> f64 {
        match self {
            Curve::Linear => x,
            Curve::Oct2 => octave(4.0, 0.25, x),
            Curve::Oct3 => octave(8.0, 0.125, x),
            Curve::Oct4 => octave(16.0, 0.0625, x),
            Curve::Oct5 => octave(32.0, 0.03125, x),
            Curve::Oct6 => octave(64.0, 0.015625, x),
            Curve::Dec2 => decade(100.0, x),
            Curve::Dec3 => decade(1000.0, x),
            Curve::Dec4 => decade(10000.0, x),
        }
    }

    /// Look up the response for a normalized value
    #[inline]
    pub fn apply(self, raw: f32) -> f32 {
        get(raw, self)
    }
}

#[inline]
fn octave(base: f64, offset: f64, x: f64) -> f64 {
    (base.powf(x) - 1.0) / base + offset
}

#[inline]
fn decade(base: f64, x: f64) -> f64 {
    base.powf(x) / base
}

type Table = Box<[f32]>;

static TABLES: OnceLock<[Table; 8]> = OnceLock::new();

fn build(curve: Curve) -> Table {
    let last = (TABLE_SIZE - 1) as f64;
    let first_value = curve.shape(0.0);
    let last_value = curve.shape(1.0);
    let span = last_value - first_value;

    let mut table: Vec<f32> = (0..TABLE_SIZE)
        .map(|i| ((curve.shape(i as f64 / last) - first_value) / span) as f32)
        .collect();

    // Pin endpoints against rounding
    table[0] = 0.0;
    table[TABLE_SIZE - 1] = 1.0;
    table.into_boxed_slice()
}

fn tables() -> &'static [Table; 8] {
    TABLES.get_or_init(|| {
        log::debug!("tables: building {} response tables", Curve::TABLES.len());
        Curve::TABLES.map(build)
    })
}

/// Force table construction ahead of the first lookup
///
/// Lookups build the tables lazily, but the first one pays for it. Call this
/// during startup so the audio path never does.
pub fn init() {
    tables();
}

/// Map a normalized value through a response curve
///
/// Out-of-range inputs clamp to the table ends. [`Curve::Linear`] returns
/// `raw` unchanged.
#[inline]
pub fn get(raw: f32, curve: Curve) -> f32 {
    let Some(slot) = curve.slot() else {
        return raw;
    };
    let table = &tables()[slot];
    let index = (raw * (TABLE_SIZE - 1) as f32 + INDEX_EPSILON).max(0.0) as usize;
    table[index.min(TABLE_SIZE - 1)]
}
