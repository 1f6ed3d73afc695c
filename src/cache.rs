//! Glyph cache for characters that are not in the ROM font.
//!
//! The eight CGRAM slots hold whatever extended characters were printed last. A character that is
//! already loaded costs a single data write, otherwise its bitmap from [`crate::glyphs`] is
//! programmed into a free slot, or into the least recently used one when all are taken.
//!
//! Reprogramming a slot changes every cell on screen that shows it, so text with more than eight
//! distinct extended characters on screen at once cannot be displayed correctly.

use crate::error::Error;
use crate::glyphs::{self, FALLBACK};
use crate::surface::DeviceSurface;
use crate::{Lcd, GLYPH_SLOTS};

/// One CGRAM slot as seen by the cache. Codepoint 0 marks a free slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CacheEntry {
    pub codepoint: u32,
    /// Value of the use clock at the last hit or load.
    pub last_used: u32,
}

impl CacheEntry {
    pub fn is_free(&self) -> bool {
        self.codepoint == 0
    }
}

/// Slot chosen for a character that was not resident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Claim {
    pub slot: u8,
    /// Character that had to make room, `None` if the slot was free.
    pub evicted: Option<u32>,
}

/// Slot bookkeeping with least recently used eviction.
#[derive(Debug, Clone)]
pub struct GlyphCache {
    entries: [CacheEntry; GLYPH_SLOTS],
    clock: u32,
}

impl Default for GlyphCache {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphCache {
    pub const fn new() -> Self {
        Self {
            entries: [CacheEntry {
                codepoint: 0,
                last_used: 0,
            }; GLYPH_SLOTS],
            clock: 0,
        }
    }

    /// Forget every assignment, e.g. because the slots were taken over by a bar graph.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Slot holding `codepoint`, refreshing its use stamp.
    pub fn hit(&mut self, codepoint: u32) -> Option<u8> {
        if codepoint == 0 {
            return None;
        }
        let slot = self.slot_of(codepoint)?;
        let stamp = self.tick();
        self.entries[slot as usize].last_used = stamp;
        Some(slot)
    }

    /// Slot holding `codepoint`, without touching the use stamp.
    pub fn slot_of(&self, codepoint: u32) -> Option<u8> {
        self.entries
            .iter()
            .position(|e| !e.is_free() && e.codepoint == codepoint)
            .map(|idx| idx as u8)
    }

    /// Assign a slot to `codepoint`: the first free one, or the least recently used.
    pub fn claim(&mut self, codepoint: u32) -> Claim {
        let slot = match self.entries.iter().position(CacheEntry::is_free) {
            Some(idx) => idx,
            None => self
                .entries
                .iter()
                .enumerate()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(idx, _)| idx)
                .unwrap_or(0),
        };
        let previous = self.entries[slot];
        let stamp = self.tick();
        self.entries[slot] = CacheEntry {
            codepoint,
            last_used: stamp,
        };
        Claim {
            slot: slot as u8,
            evicted: (!previous.is_free()).then_some(previous.codepoint),
        }
    }

    /// Mark `slot` free.
    pub fn release(&mut self, slot: u8) {
        if let Some(entry) = self.entries.get_mut(slot as usize) {
            *entry = CacheEntry::default();
        }
    }

    pub fn entries(&self) -> &[CacheEntry; GLYPH_SLOTS] {
        &self.entries
    }

    fn tick(&mut self) -> u32 {
        if self.clock == u32::MAX {
            self.renumber();
        }
        self.clock += 1;
        self.clock
    }

    /// Compress the use stamps to 1..=8 keeping their order.
    fn renumber(&mut self) {
        let mut order: [usize; GLYPH_SLOTS] = core::array::from_fn(|idx| idx);
        order.sort_unstable_by_key(|&idx| self.entries[idx].last_used);
        for (rank, idx) in order.into_iter().enumerate() {
            self.entries[idx].last_used = rank as u32 + 1;
        }
        self.clock = GLYPH_SLOTS as u32;
    }
}

/// What printing an extended character took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CacheOutcome {
    /// Glyph was resident in this slot.
    Hit(u8),
    /// Glyph was programmed into this slot.
    Loaded(u8),
    /// No glyph exists, the placeholder was printed.
    Unsupported,
}

impl<S> Lcd<S>
where
    S: DeviceSurface,
{
    /// Print `codepoint` through the glyph cache at the cursor.
    ///
    /// Only meant for characters outside of the ROM font, anything without a glyph in
    /// [`crate::glyphs::GLYPHS`] is printed as `?`. Loading a glyph ends an active bar graph.
    pub fn emit(&mut self, codepoint: u32) -> Result<CacheOutcome, Error<S::Error>> {
        if let Some(slot) = self.cache.hit(codepoint) {
            self.write_raw(slot)?;
            return Ok(CacheOutcome::Hit(slot));
        }

        let Some(bitmap) = glyphs::bitmap(codepoint) else {
            self.unsupported = self.unsupported.saturating_add(1);
            #[cfg(feature = "defmt")]
            defmt::debug!("no glyph for {=u32:#x}", codepoint);
            self.write_raw(FALLBACK)?;
            return Ok(CacheOutcome::Unsupported);
        };

        let _replaced = self.graph.deactivate();
        #[cfg(feature = "defmt")]
        if let Some(kind) = _replaced {
            defmt::debug!("glyph cache takes over slots from {}", kind);
        }

        let claim = self.cache.claim(codepoint);
        #[cfg(feature = "defmt")]
        if let Some(evicted) = claim.evicted {
            defmt::debug!("slot {} evicts {=u32:#x}", claim.slot, evicted);
        }
        if let Err(e) = self.program_slot(claim.slot, bitmap) {
            self.cache.release(claim.slot);
            return Err(e.into());
        }
        self.write_raw(claim.slot)?;
        Ok(CacheOutcome::Loaded(claim.slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{lcd, BusFault};

    const CYRILLIC: [char; 9] = ['Б', 'Г', 'Д', 'Ж', 'З', 'И', 'Й', 'Л', 'П'];

    #[test]
    fn test_claim_prefers_free_slots() {
        let mut cache = GlyphCache::new();
        for (idx, c) in CYRILLIC[..8].iter().enumerate() {
            let claim = cache.claim(*c as u32);
            assert_eq!(claim.slot as usize, idx);
            assert_eq!(claim.evicted, None);
        }
    }

    #[test]
    fn test_claim_evicts_least_recently_used() {
        let mut cache = GlyphCache::new();
        for c in &CYRILLIC[..8] {
            cache.claim(*c as u32);
        }
        // Touch everything but 'Г' (slot 1).
        for c in CYRILLIC[..8].iter().filter(|&&c| c != 'Г') {
            assert!(cache.hit(*c as u32).is_some());
        }
        let claim = cache.claim('П' as u32);
        assert_eq!(claim.slot, 1);
        assert_eq!(claim.evicted, Some('Г' as u32));
        assert_eq!(cache.slot_of('Г' as u32), None);
        assert_eq!(cache.slot_of('П' as u32), Some(1));
    }

    #[test]
    fn test_release_frees_slot() {
        let mut cache = GlyphCache::new();
        cache.claim('Б' as u32);
        cache.claim('Г' as u32);
        cache.release(0);
        assert!(cache.entries()[0].is_free());
        assert_eq!(cache.claim('Д' as u32).slot, 0);
    }

    #[test]
    fn test_zero_is_never_resident() {
        let mut cache = GlyphCache::new();
        assert_eq!(cache.hit(0), None);
    }

    #[test]
    fn test_clock_renumbering_keeps_order() {
        let mut cache = GlyphCache::new();
        for c in &CYRILLIC[..8] {
            cache.claim(*c as u32);
        }
        cache.clock = u32::MAX - 1;
        cache.hit('Б' as u32);
        // Clock is exhausted now, the next tick renumbers.
        cache.hit('Г' as u32);
        assert!(cache.clock <= GLYPH_SLOTS as u32 + 1);
        // 'Д' was the oldest before renumbering and still is.
        assert_eq!(cache.claim('П' as u32).evicted, Some('Д' as u32));
    }

    #[test]
    fn test_repeated_character_is_a_hit() {
        let mut lcd = lcd(16, 2);
        assert_eq!(lcd.emit('Ж' as u32), Ok(CacheOutcome::Loaded(0)));
        let programs = lcd.surface().cgram_selects;
        assert_eq!(lcd.emit('Ж' as u32), Ok(CacheOutcome::Hit(0)));
        assert_eq!(lcd.surface().cgram_selects, programs);
        assert_eq!(&lcd.surface().row_text(0, 16)[..2], &[0, 0]);
        assert_eq!(lcd.surface().glyph(0), *glyphs::bitmap('Ж' as u32).unwrap());
    }

    #[test]
    fn test_ninth_character_evicts_once() {
        let mut lcd = lcd(20, 4);
        for c in CYRILLIC {
            lcd.emit(c as u32).unwrap();
        }
        assert_eq!(lcd.surface().cgram_selects, 9);
        // 'Б' was least recently used and made room for 'П'.
        assert_eq!(lcd.cache.slot_of('Б' as u32), None);
        assert_eq!(lcd.cache.slot_of('П' as u32), Some(0));
        assert_eq!(
            lcd.cache.entries().iter().filter(|e| !e.is_free()).count(),
            GLYPH_SLOTS
        );

        assert_eq!(lcd.emit('Б' as u32), Ok(CacheOutcome::Loaded(1)));
        assert_eq!(lcd.surface().cgram_selects, 10);
        assert_eq!(lcd.emit('Б' as u32), Ok(CacheOutcome::Hit(1)));
        assert_eq!(lcd.surface().cgram_selects, 10);
    }

    #[test]
    fn test_load_keeps_cursor_in_text_stream() {
        let mut lcd = lcd(16, 2);
        lcd.set_cursor(3, 1).unwrap();
        lcd.write_raw(b'x').unwrap();
        lcd.emit('Ф' as u32).unwrap();
        lcd.write_raw(b'y').unwrap();
        assert_eq!(&lcd.surface().row_text(1, 16)[3..6], &[b'x', 0, b'y']);
        assert_eq!(lcd.cursor().col, 6);
    }

    #[test]
    fn test_unknown_character_prints_placeholder() {
        let mut lcd = lcd(16, 2);
        assert_eq!(lcd.emit('€' as u32), Ok(CacheOutcome::Unsupported));
        assert_eq!(lcd.surface().row_text(0, 16)[0], b'?');
        assert_eq!(lcd.unsupported_count(), 1);
        assert_eq!(lcd.surface().cgram_selects, 0);
    }

    #[test]
    fn test_failed_load_frees_slot() {
        let mut lcd = lcd(16, 2);
        let sent_so_far = lcd.surface().commands.len();
        // Let the CGRAM address through, fail on the bitmap.
        lcd.surface_mut().fail_after = Some(sent_so_far + 1);
        assert_eq!(lcd.emit('Ш' as u32), Err(Error::Bus(BusFault)));
        assert_eq!(lcd.cache.slot_of('Ш' as u32), None);
    }

    #[test]
    fn test_text_after_failed_load_goes_to_screen() {
        let mut lcd = lcd(16, 2);
        lcd.set_cursor(3, 0).unwrap();
        let sent = lcd.surface().sent();
        // Bus drops out right after the slot was selected.
        lcd.surface_mut().fail_after = Some(sent + 1);
        assert!(lcd.emit('Ш' as u32).is_err());
        lcd.surface_mut().fail_after = None;

        lcd.write_raw(b'x').unwrap();
        assert_eq!(lcd.surface().at(3, 0, 16), b'x');
        assert_eq!(lcd.surface().glyph(0), [0; 8]);
        assert_eq!(lcd.cursor().col, 4);
    }

    #[test]
    fn test_failed_load_right_to_left_restores_entry_mode() {
        let mut lcd = lcd(16, 2);
        lcd.set_right_to_left(true).unwrap();
        lcd.set_cursor(5, 1).unwrap();
        let sent = lcd.surface().sent();
        // Entry mode, slot address and one bitmap row get through.
        lcd.surface_mut().fail_after = Some(sent + 3);
        assert!(lcd.emit('Ш' as u32).is_err());
        lcd.surface_mut().fail_after = None;

        lcd.write_raw(b'a').unwrap();
        lcd.write_raw(b'b').unwrap();
        assert_eq!(&lcd.surface().row_text(1, 16)[4..6], b"ba");
    }

    #[test]
    fn test_cursor_move_after_failed_read_leaves_cgram() {
        let mut lcd = lcd(16, 2);
        let sent = lcd.surface().sent();
        lcd.surface_mut().fail_after = Some(sent + 1);
        // Slot gets selected, going back to DDRAM fails.
        assert!(lcd.read_glyph(2).is_err());
        lcd.surface_mut().fail_after = None;

        lcd.set_cursor(7, 1).unwrap();
        lcd.write_raw(b'z').unwrap();
        assert_eq!(lcd.surface().at(7, 1, 16), b'z');
        assert_eq!(lcd.surface().glyph(2), [0; 8]);
    }

    #[test]
    fn test_load_ends_bar_graph() {
        let mut lcd = lcd(16, 2);
        lcd.init_bargraph(crate::GraphType::HorizontalBar).unwrap();
        lcd.emit('Ш' as u32).unwrap();
        assert_eq!(lcd.graph.kind(), None);
        assert_eq!(
            lcd.draw_horizontal_bar(0, 0, 4, 3),
            Err(Error::RendererNotInitialized)
        );
    }
}
