use crate::cache::object_cache::moka::MokaCacheWrapper;
use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::AppConfig;
use crate::errors::{ClassroomError, Result};
use crate::models::users::entities::UserRole;
use crate::models::users::requests::CreateUserRequest;
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
}

/// 创建缓存实例
async fn create_cache() -> Result<Arc<dyn ObjectCache>> {
    let config = AppConfig::get();
    let cache_type = &config.cache.cache_type;

    warn!("Attempting to create {} cache backend", cache_type);

    // 根据配置选择缓存后端
    match get_object_cache_plugin(cache_type) {
        Some(constructor) => match constructor().await {
            Ok(cache) => {
                warn!("Successfully created {} cache backend", cache_type);
                return Ok(Arc::from(cache));
            }
            Err(e) => warn!("Failed to create {} cache: {}", cache_type, e),
        },
        None => warn!("Cache backend '{}' not found in registry", cache_type),
    }

    // 回退到内存缓存
    warn!("Falling back to Moka (in-memory) cache backend");
    MokaCacheWrapper::from_config()
        .map(|cache| Arc::new(cache) as Arc<dyn ObjectCache>)
        .map_err(|e| {
            ClassroomError::cache_plugin_not_found(format!(
                "No cache backend available (tried: {cache_type}): {e}"
            ))
        })
}

/// 初始化默认管理员账号
///
/// 数据库中没有任何用户时创建管理员，并输出一个引导用的访问令牌。
async fn seed_admin(storage: &Arc<dyn Storage>) {
    match storage.count_users().await {
        Ok(count) if count > 0 => {
            debug!(
                "Database already has {} user(s), skipping admin seed",
                count
            );
            return;
        }
        Ok(_) => {
            info!("No users found in database, creating default admin account...");
        }
        Err(e) => {
            warn!("Failed to count users: {}, skipping admin seed", e);
            return;
        }
    }

    let email = std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@localhost.dev".to_string());
    let admin_request = CreateUserRequest {
        name: "Administrator".to_string(),
        email,
        role: UserRole::Admin,
        department: None,
        image_url: None,
        phone: None,
        address: None,
    };

    let user = match storage.create_user(admin_request).await {
        Ok(user) => user,
        Err(e) => {
            warn!("Failed to create admin account: {}", e);
            return;
        }
    };

    info!(
        "Default admin account created (ID: {}, email: {})",
        user.id, user.email
    );

    match JwtUtils::generate_access_token(user.id, UserRole::ADMIN) {
        Ok(token) => {
            warn!("==========================================================");
            warn!("  BOOTSTRAP ADMIN ACCESS TOKEN (valid for a limited time)");
            warn!("  {}", token);
            warn!("==========================================================");
        }
        Err(e) => warn!("Failed to issue bootstrap admin token: {}", e),
    }
}

/// 准备服务器启动的上下文
/// 包括存储与缓存
pub async fn prepare_server_startup() -> Result<StartupContext> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    if cfg!(debug_assertions) {
        crate::cache::register::debug_object_cache_registry();
    }

    let storage = crate::storage::create_storage().await?;
    warn!("Storage backend initialized and migrations completed");

    // 初始化默认管理员账号（如果需要）
    seed_admin(&storage).await;

    // 创建缓存实例
    let cache = create_cache().await?;
    warn!("Cache backend initialized");

    Ok(StartupContext { storage, cache })
}
