pub mod dark_object;
pub mod indices;
pub mod pipeline;
pub mod radiometric;
pub mod resample;
