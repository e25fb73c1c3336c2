//! Static save layout: byte ranges, field encodings and the slot-relative
//! offsets of every field the editor understands.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn new(start: usize, len: usize) -> Self {
        Self {
            start,
            end: start.saturating_add(len),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn overlaps(&self, other: &ByteRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn fits_within(&self, len: usize) -> bool {
        self.start <= self.end && self.end <= len
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEncoding {
    SignedLe,
    UnsignedLe,
    SingleByte,
    NibbleLow,
    NibbleHigh,
    /// One byte replicated `count` times, `stride` bytes apart.
    RepeatedByte { count: usize, stride: usize },
    RawHex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub offset: usize,
    pub size: usize,
    pub encoding: FieldEncoding,
}

impl FieldDescriptor {
    pub const fn new(
        name: &'static str,
        offset: usize,
        size: usize,
        encoding: FieldEncoding,
    ) -> Self {
        Self {
            name,
            offset,
            size,
            encoding,
        }
    }

    pub const fn signed(name: &'static str, offset: usize) -> Self {
        Self::new(name, offset, 4, FieldEncoding::SignedLe)
    }

    pub const fn byte(name: &'static str, offset: usize) -> Self {
        Self::new(name, offset, 1, FieldEncoding::SingleByte)
    }

    pub const fn hex(name: &'static str, offset: usize, size: usize) -> Self {
        Self::new(name, offset, size, FieldEncoding::RawHex)
    }

    /// Number of bytes from the first touched byte to the last one, inclusive.
    pub fn span(&self) -> usize {
        match self.encoding {
            FieldEncoding::RepeatedByte { count, stride } => {
                if count == 0 {
                    0
                } else {
                    (count - 1) * stride + 1
                }
            }
            _ => self.size,
        }
    }

    pub fn range_at(&self, base: usize) -> ByteRange {
        ByteRange::new(base.saturating_add(self.offset), self.span())
    }
}

// Card container geometry
pub const CARD_FRAMES: usize = 16;
pub const CARD_BLOCK_SIZE: usize = 8192;
pub const FRAME_HEADER_SIZE: usize = 128;
pub const EMULATOR_PREFIX_SIZE: usize = 3904;
pub const FRAME_OCCUPIED: u8 = 0x51;
pub const FRAME_GAME_ID_OFFSET: usize = 10;
pub const GAME_ID_LEN: usize = 16;

// Single-save export geometry (absolute offsets)
pub const EXPORT_GAME_ID_OFFSET: usize = 100;
pub const EXPORT_START_OFFSET_BYTE: usize = 68;

// Slot-relative fields
pub const ARCADE_TRACK_COUNT: usize = 21;
pub const CAREER_EVENT_COUNT: usize = 248;
pub const CAREER_EVENTS_FOR_FULL_COMPLETION: usize = 219;
pub const CAREER_PROGRESS_BYTES: usize = CAREER_EVENT_COUNT / 2;
pub const LICENSE_COUNT: usize = 6;
pub const TESTS_PER_LICENSE: usize = 10;
pub const LICENSE_TEST_STRIDE: usize = 164;
pub const MAX_CAR_COUNT: usize = 100;
pub const NO_CURRENT_CAR: u8 = 255;

pub const LANGUAGE: FieldDescriptor = FieldDescriptor::byte("language", 512);
pub const ARCADE_PROGRESS: FieldDescriptor = FieldDescriptor::new(
    "arcade_progress",
    696,
    1,
    FieldEncoding::RepeatedByte {
        count: ARCADE_TRACK_COUNT,
        stride: 1,
    },
);
pub const DAYS: FieldDescriptor = FieldDescriptor::signed("days", 760);
pub const RACES: FieldDescriptor = FieldDescriptor::signed("races", 768);
pub const WINS: FieldDescriptor = FieldDescriptor::signed("wins", 772);
pub const BEST_RANK_SUM: FieldDescriptor = FieldDescriptor::signed("best_rank_sum", 776);
pub const RANK_SUM: FieldDescriptor = FieldDescriptor::signed("rank_sum", 780);
pub const PRIZE: FieldDescriptor = FieldDescriptor::signed("prize", 788);
pub const CAREER_PROGRESS: FieldDescriptor =
    FieldDescriptor::hex("career_progress", 792, CAREER_PROGRESS_BYTES);
pub const ENDING_MOVIE: FieldDescriptor = FieldDescriptor::byte("ending_movie", 1045);
/// Every test of every license, starting at the first S-license test.
pub const LICENSE_PROGRESS: FieldDescriptor = FieldDescriptor::new(
    "license_progress",
    5657,
    1,
    FieldEncoding::RepeatedByte {
        count: LICENSE_COUNT * TESTS_PER_LICENSE,
        stride: LICENSE_TEST_STRIDE,
    },
);
pub const CAR_COUNT: FieldDescriptor =
    FieldDescriptor::new("car_count", 15988, 1, FieldEncoding::UnsignedLe);
pub const FIRST_CAR_OFFSET: usize = 15992;
pub const MONEY: FieldDescriptor = FieldDescriptor::signed("money", 32392);
pub const CURRENT_CAR: FieldDescriptor =
    FieldDescriptor::new("current_car", 32396, 1, FieldEncoding::UnsignedLe);
pub const CHECKSUM: FieldDescriptor =
    FieldDescriptor::new("checksum", 32412, 4, FieldEncoding::UnsignedLe);

pub const LICENSE_NAMES: [&str; LICENSE_COUNT] = ["S", "IA", "IB", "IC", "A", "B"];

/// Career event `index` (0..248): even events live in the low nibble of a
/// byte, odd events in the high nibble of the same byte.
pub fn career_event(index: usize) -> FieldDescriptor {
    let encoding = if index % 2 == 0 {
        FieldEncoding::NibbleLow
    } else {
        FieldEncoding::NibbleHigh
    };
    FieldDescriptor::new("career_event", CAREER_PROGRESS.offset + index / 2, 1, encoding)
}

/// First test byte of license `index` in [`LICENSE_NAMES`] order.
pub fn license_offset(index: usize) -> usize {
    LICENSE_PROGRESS.offset + index * TESTS_PER_LICENSE * LICENSE_TEST_STRIDE
}

/// Bytes from slot start through the end of the checksum field.
pub const SLOT_LEN: usize = CHECKSUM.offset + 4;
