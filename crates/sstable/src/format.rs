use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Result as IoResult, Seek, SeekFrom, Write};

/// Magic identifying a silt SSTable.
pub const SSTABLE_MAGIC: u32 = 0x534C_5431; // "SLT1"

/// Footer size: index_offset (u64) + entry_count (u64) + magic (u32).
pub const FOOTER_BYTES: u64 = 8 + 8 + 4;

/// Position where the footer starts (`filesize - FOOTER_BYTES`).
pub fn footer_pos(filesize: u64) -> u64 {
    filesize.saturating_sub(FOOTER_BYTES)
}

/// Writes the footer: index offset, entry count, magic.
pub fn write_footer<W: Write>(w: &mut W, index_offset: u64, entry_count: u64) -> IoResult<()> {
    w.write_u64::<LittleEndian>(index_offset)?;
    w.write_u64::<LittleEndian>(entry_count)?;
    w.write_u32::<LittleEndian>(SSTABLE_MAGIC)?;
    Ok(())
}

/// Seeks to the footer and reads `(index_offset, entry_count, magic)`.
pub fn read_footer<R: Read + Seek>(r: &mut R) -> IoResult<(u64, u64, u32)> {
    let filesize = r.seek(SeekFrom::End(0))?;
    r.seek(SeekFrom::Start(footer_pos(filesize)))?;
    let index_offset = r.read_u64::<LittleEndian>()?;
    let entry_count = r.read_u64::<LittleEndian>()?;
    let magic = r.read_u32::<LittleEndian>()?;
    Ok((index_offset, entry_count, magic))
}
