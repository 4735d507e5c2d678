// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的临时数据库、API 组装、样例清单
// ==========================================

#![allow(dead_code)]

use std::error::Error;
use std::sync::Arc;

use stockcheck::app::AppState;
use stockcheck::config::ConfigManager;
use stockcheck::StockCheckApi;
use tempfile::NamedTempFile;

/// 样例清单: 五列，新/二手混合，成色大小写不一
pub const SAMPLE_CSV: &str = "\
Stock #,Condition,Make,Model,Calibre
A1,New,Ruger,10/22,22LR
A2,Used,Ruger,10/22,22LR
B7,New,Tikka,T3x,308
C3,new,Tikka,T3x,6.5CM
D4,New,Browning,X-Bolt,
";

/// 表头无法自动识别成色列的清单（需要手工映射）
pub const UNMAPPED_CSV: &str = "\
Stock #,Grade,Make,Model
A1,New,Ruger,10/22
A2,Used,Ruger,10/22
";

/// 创建临时测试数据库
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();
    Ok((temp_file, db_path))
}

/// 测试环境: 保持临时文件存活
pub struct TestEnv {
    pub _temp_file: NamedTempFile,
    pub db_path: String,
    pub api: Arc<StockCheckApi>,
    pub config: Arc<ConfigManager>,
}

/// 组装完整应用状态（与 CLI 相同路径）
pub fn setup() -> TestEnv {
    stockcheck::logging::init_test();
    let (temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let state = AppState::new(db_path.clone()).expect("初始化AppState失败");
    TestEnv {
        _temp_file: temp_file,
        db_path,
        api: state.stockcheck_api.clone(),
        config: state.config_manager.clone(),
    }
}

/// 组装并导入样例清单
pub async fn setup_with_sample() -> TestEnv {
    let env = setup();
    env.api
        .import_csv("inventory.csv", SAMPLE_CSV)
        .await
        .expect("导入样例清单失败");
    env
}
