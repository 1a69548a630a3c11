//! In-memory preset slots
//!
//! A preset is a flat blob of raw values: one per parameter, then three
//! auxiliary slots. Slot `PARAMETER_COUNT` is unused and kept for layout
//! compatibility; the next two hold the wet/dry and early/late mixes.

use crate::reverb::PARAMETER_COUNT;

/// Length of one preset blob
pub const PRESET_LEN: usize = PARAMETER_COUNT + 3;
/// Blob slot holding the wet/dry crossfade position
pub const WET_DRY_SLOT: usize = PARAMETER_COUNT + 1;
/// Blob slot holding the early/late balance
pub const EARLY_LATE_SLOT: usize = PARAMETER_COUNT + 2;
/// Number of preset slots in a bank
pub const NUM_PRESETS: usize = 3;

/// Raw values of every parameter plus the auxiliary mix slots
pub type PresetBlob = [f32; PRESET_LEN];

/// Fixed set of preset slots with a cursor
#[derive(Debug, Clone)]
pub struct PresetBank {
    presets: [PresetBlob; NUM_PRESETS],
    current: usize,
}

impl PresetBank {
    pub fn new() -> Self {
        Self {
            presets: [[0.0; PRESET_LEN]; NUM_PRESETS],
            current: 0,
        }
    }

    /// Index of the selected slot
    pub fn current(&self) -> usize {
        self.current
    }

    /// Store `blob` in `slot`; out-of-range slots are ignored
    pub fn save(&mut self, slot: usize, blob: &PresetBlob) {
        match self.presets.get_mut(slot) {
            Some(preset) => *preset = *blob,
            None => log::warn!("PresetBank::save: slot {} out of range", slot),
        }
    }

    /// Store `blob` in the selected slot
    pub fn save_current(&mut self, blob: &PresetBlob) {
        self.save(self.current, blob);
    }

    pub fn recall(&self, slot: usize) -> Option<&PresetBlob> {
        self.presets.get(slot)
    }

    /// Move to the next slot, wrapping after the last, and return it
    pub fn advance(&mut self) -> &PresetBlob {
        self.current = (self.current + 1) % NUM_PRESETS;
        &self.presets[self.current]
    }
}

impl Default for PresetBank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_recall() {
        let mut bank = PresetBank::new();
        let mut blob = [0.0; PRESET_LEN];
        blob[3] = 0.25;
        blob[EARLY_LATE_SLOT] = 0.6;

        bank.save(2, &blob);
        assert_eq!(bank.recall(2), Some(&blob));
        assert_eq!(bank.recall(0), Some(&[0.0; PRESET_LEN]));
        assert_eq!(bank.recall(NUM_PRESETS), None);
    }

    #[test]
    fn test_save_out_of_range_ignored() {
        let mut bank = PresetBank::new();
        bank.save(NUM_PRESETS, &[1.0; PRESET_LEN]);
        for slot in 0..NUM_PRESETS {
            assert_eq!(bank.recall(slot), Some(&[0.0; PRESET_LEN]));
        }
    }

    #[test]
    fn test_advance_wraps() {
        let mut bank = PresetBank::new();
        let mut blob = [0.0; PRESET_LEN];
        blob[0] = 1.0;
        bank.save(0, &blob);

        let visited: Vec<usize> = (0..4)
            .map(|_| {
                bank.advance();
                bank.current()
            })
            .collect();
        assert_eq!(visited, vec![1, 2, 0, 1]);

        bank.advance();
        bank.advance();
        assert_eq!(bank.current(), 0);
        assert_eq!(bank.recall(bank.current()), Some(&blob));
    }

    #[test]
    fn test_save_current() {
        let mut bank = PresetBank::new();
        bank.advance();
        bank.save_current(&[0.5; PRESET_LEN]);
        assert_eq!(bank.recall(1), Some(&[0.5; PRESET_LEN]));
    }
}
