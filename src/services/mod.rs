pub mod archive;
pub mod conversion_service;
pub mod filenames;
pub mod pdf_writer;
pub mod rasterizer;
pub mod workspace;
