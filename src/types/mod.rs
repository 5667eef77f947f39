pub mod modality;
pub mod observation;
pub mod station;
pub mod weather_report;
