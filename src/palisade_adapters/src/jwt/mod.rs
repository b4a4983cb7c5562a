pub mod jsonwebtoken_codec;
