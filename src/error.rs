use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("读写失败: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
