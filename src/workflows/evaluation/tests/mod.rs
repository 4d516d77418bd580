mod award;
mod common;
