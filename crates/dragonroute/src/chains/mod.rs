pub mod kaia;
