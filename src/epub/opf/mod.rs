//! OPF（Open Packaging Format）文件解析模块
//!
//! 解析包文件中的标题、清单与脊柱。

mod manifest;
mod parser;

pub use manifest::{Manifest, ManifestItem, NCX_MEDIA_TYPE};
pub use parser::{DEFAULT_TITLE, Package, opf_directory};
