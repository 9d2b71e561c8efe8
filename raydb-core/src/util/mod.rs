pub mod ascii85;
