pub mod external_links;
pub mod figure_captions;
pub mod image_paths;
pub mod math_tags;
