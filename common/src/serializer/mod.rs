mod reader;
mod writer;

pub use reader::*;
pub use writer::*;

// Types that have a fixed little-endian wire representation
pub trait Serializer {
    fn write(&self, writer: &mut Writer);

    fn read(reader: &mut Reader) -> Result<Self, ReaderError>
    where
        Self: Sized;

    fn size(&self) -> usize;

    fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.size());
        let mut writer = Writer::new(&mut buffer);
        self.write(&mut writer);
        buffer
    }

    fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}
