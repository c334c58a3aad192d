// ── Tile data decoding ───────────────────────────────────────────────────────
//
// A layer's <data> element turns into one raw 32-bit id per cell:
//
//   <data>                        one <tile gid=".."/> per cell
//   <data encoding="csv">         comma separated decimal ids
//   <data encoding="base64">      little-endian u32s, optionally zlib/gzip
//
// The top three bits of every id are flip flags; the rest is the global id
// resolved against the map's tilesets.

use std::io::Read;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::{GzDecoder, ZlibDecoder};
use roxmltree::Node;
use tracing::warn;

use crate::error::{Error, Result};
use crate::map::xml;

pub const FLIP_H: u32 = 0x8000_0000;
pub const FLIP_V: u32 = 0x4000_0000;
pub const FLIP_D: u32 = 0x2000_0000;
const FLIP_MASK: u32 = FLIP_H | FLIP_V | FLIP_D;

/// Flip bits of a tile.  Decoded and kept, but not applied to UVs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FlipFlags {
    pub horizontal: bool,
    pub vertical: bool,
    pub diagonal: bool,
}

/// Split a raw id into its global id and flip flags.
pub fn split_gid(raw: u32) -> (u32, FlipFlags) {
    let flip = FlipFlags {
        horizontal: raw & FLIP_H != 0,
        vertical: raw & FLIP_V != 0,
        diagonal: raw & FLIP_D != 0,
    };
    (raw & !FLIP_MASK, flip)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// One `<tile gid>` element per cell.
    Xml,
    Csv,
    Base64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Compression {
    None,
    Zlib,
    Gzip,
}

impl Encoding {
    pub fn parse(value: Option<&str>) -> Result<Self> {
        match value {
            None => Ok(Encoding::Xml),
            Some("csv") => Ok(Encoding::Csv),
            Some("base64") => Ok(Encoding::Base64),
            Some(other) => Err(Error::UnsupportedEncoding(other.to_string())),
        }
    }
}

impl Compression {
    pub fn parse(value: Option<&str>) -> Result<Self> {
        match value {
            None | Some("") => Ok(Compression::None),
            Some("zlib") => Ok(Compression::Zlib),
            Some("gzip") => Ok(Compression::Gzip),
            Some(other) => Err(Error::UnsupportedCompression(other.to_string())),
        }
    }
}

// ── Tile ─────────────────────────────────────────────────────────────────────

/// One resolved tile reference.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Tile {
    /// Transparent cell (gid 0).
    #[default]
    Null,
    Set {
        /// Index into the map's tileset list.
        tileset: usize,
        /// Tile index inside that tileset.
        local_id: u32,
        flip: FlipFlags,
    },
}

impl Tile {
    pub fn new(tileset: usize, local_id: u32) -> Self {
        Tile::Set { tileset, local_id, flip: FlipFlags::default() }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Tile::Null)
    }

    pub fn tileset(&self) -> Option<usize> {
        match self {
            Tile::Set { tileset, .. } => Some(*tileset),
            Tile::Null => None,
        }
    }

    pub fn local_id(&self) -> Option<u32> {
        match self {
            Tile::Set { local_id, .. } => Some(*local_id),
            Tile::Null => None,
        }
    }

    pub fn flip(&self) -> FlipFlags {
        match self {
            Tile::Set { flip, .. } => *flip,
            Tile::Null => FlipFlags::default(),
        }
    }

    /// `(tileset, local_id)`, ignoring flips.
    pub fn pair(&self) -> Option<(usize, u32)> {
        Some((self.tileset()?, self.local_id()?))
    }
}

/// Resolve a raw id against tilesets sorted by ascending first gid.
///
/// Walks the list from the last tileset to the first and appends one entry
/// for every tileset whose first gid is `<=` the id, so with several
/// tilesets a cell can carry more than one entry.  The first entry is the
/// one from the highest qualifying first gid.  A gid with no qualifying
/// tileset resolves to `Tile::Null`.
pub fn resolve(raw: u32, first_gids: &[u32], out: &mut Vec<Tile>) {
    let (gid, flip) = split_gid(raw);
    if gid == 0 {
        out.push(Tile::Null);
        return;
    }

    let before = out.len();
    for (tileset, &first) in first_gids.iter().enumerate().rev() {
        if first <= gid {
            out.push(Tile::Set { tileset, local_id: gid - first, flip });
        }
    }

    if out.len() == before {
        warn!("gid {gid} is below every tileset's firstgid; treating it as empty");
        out.push(Tile::Null);
    }
}

// ── Raw id streams ───────────────────────────────────────────────────────────

/// Comma separated decimal ids.  Whitespace around tokens and a trailing
/// comma are tolerated.
pub fn decode_csv(text: &str) -> Result<Vec<u32>> {
    text.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<u32>().map_err(|_| Error::InvalidTileId(t.to_string())))
        .collect()
}

/// Base64 text, decompressed if needed, read as little-endian u32s.
///
/// `expected` is the cell count; compressed payloads must inflate to exactly
/// `expected * 4` bytes.
pub fn decode_base64(text: &str, compression: Compression, expected: usize) -> Result<Vec<u32>> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let raw = STANDARD.decode(cleaned.as_bytes())?;

    let bytes = match compression {
        Compression::None => raw,
        Compression::Zlib => inflate(ZlibDecoder::new(raw.as_slice()), expected)?,
        Compression::Gzip => inflate(GzDecoder::new(raw.as_slice()), expected)?,
    };

    if bytes.len() % 4 != 0 {
        return Err(Error::InvalidTileId(format!("{} trailing byte(s) in tile data", bytes.len() % 4)));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Inflate at most one byte past `expected` ids, so the buffer only ever
/// grows with real output, whatever the layer claims its size is.
fn inflate(decoder: impl Read, expected: usize) -> Result<Vec<u8>> {
    let invalid = |msg: String| Error::Decompress(std::io::Error::new(std::io::ErrorKind::InvalidData, msg));
    let wanted = expected
        .checked_mul(4)
        .ok_or_else(|| invalid(format!("{expected} tiles overflow the tile data size")))?;

    let mut bytes = Vec::new();
    decoder.take(wanted as u64 + 1).read_to_end(&mut bytes).map_err(Error::Decompress)?;
    if bytes.len() != wanted {
        return Err(invalid(format!("inflated to {} bytes, expected {wanted}", bytes.len())));
    }
    Ok(bytes)
}

/// Decode a `<data>` element into raw ids.  The caller checks the count.
pub(crate) fn decode_data(data: Node<'_, '_>, expected: usize) -> Result<(Vec<u32>, Encoding)> {
    let encoding = Encoding::parse(data.attribute("encoding"))?;
    let compression = Compression::parse(data.attribute("compression"))?;

    let ids = match encoding {
        Encoding::Xml => xml::children(data, "tile")
            .map(|t| xml::required::<u32>(t, "tile", "gid"))
            .collect::<Result<Vec<_>>>()?,
        Encoding::Csv => decode_csv(data.text().unwrap_or(""))?,
        Encoding::Base64 => decode_base64(data.text().unwrap_or(""), compression, expected)?,
    };
    Ok((ids, encoding))
}
