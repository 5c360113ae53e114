use std::fmt;

#[derive(Debug, Clone)]
pub enum LinkgateError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    StoreTimeout(String),
    Validation(String),
    NotFound(String),
    Serialization(String),
}

impl LinkgateError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            LinkgateError::DatabaseConfig(_) => "E001",
            LinkgateError::DatabaseConnection(_) => "E002",
            LinkgateError::DatabaseOperation(_) => "E003",
            LinkgateError::StoreTimeout(_) => "E004",
            LinkgateError::Validation(_) => "E005",
            LinkgateError::NotFound(_) => "E006",
            LinkgateError::Serialization(_) => "E007",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            LinkgateError::DatabaseConfig(_) => "Database Configuration Error",
            LinkgateError::DatabaseConnection(_) => "Database Connection Error",
            LinkgateError::DatabaseOperation(_) => "Database Operation Error",
            LinkgateError::StoreTimeout(_) => "Store Timeout",
            LinkgateError::Validation(_) => "Validation Error",
            LinkgateError::NotFound(_) => "Resource Not Found",
            LinkgateError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            LinkgateError::DatabaseConfig(msg) => msg,
            LinkgateError::DatabaseConnection(msg) => msg,
            LinkgateError::DatabaseOperation(msg) => msg,
            LinkgateError::StoreTimeout(msg) => msg,
            LinkgateError::Validation(msg) => msg,
            LinkgateError::NotFound(msg) => msg,
            LinkgateError::Serialization(msg) => msg,
        }
    }
}

impl fmt::Display for LinkgateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type(), self.message())
    }
}

impl std::error::Error for LinkgateError {}

// 便捷的构造函数
impl LinkgateError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        LinkgateError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        LinkgateError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        LinkgateError::DatabaseOperation(msg.into())
    }

    pub fn store_timeout<T: Into<String>>(msg: T) -> Self {
        LinkgateError::StoreTimeout(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        LinkgateError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        LinkgateError::NotFound(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        LinkgateError::Serialization(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for LinkgateError {
    fn from(err: sea_orm::DbErr) -> Self {
        LinkgateError::DatabaseOperation(err.to_string())
    }
}

impl From<serde_json::Error> for LinkgateError {
    fn from(err: serde_json::Error) -> Self {
        LinkgateError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LinkgateError>;
