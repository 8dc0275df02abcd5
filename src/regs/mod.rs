pub mod analog;
