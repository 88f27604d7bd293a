pub mod source;
pub mod update;
pub mod watermark;

pub use source::SourceDescriptor;
pub use update::Update;
pub use watermark::WatermarkMap;
