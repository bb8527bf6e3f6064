//! 多语言错误消息模块
//!
//! 使用rat_embed_lang框架提供统一的错误消息多语言支持

use std::collections::HashMap;
use rat_embed_lang::register_translations;

/// 错误消息翻译注册器
pub struct ErrorMessageI18n;

impl ErrorMessageI18n {
    /// 插入一条三语翻译
    fn insert(
        translations: &mut HashMap<String, HashMap<String, String>>,
        key: &str,
        zh: &str,
        en: &str,
        ja: &str,
    ) {
        let mut entry = HashMap::new();
        entry.insert("zh-CN".to_string(), zh.to_string());
        entry.insert("en-US".to_string(), en.to_string());
        entry.insert("ja-JP".to_string(), ja.to_string());
        translations.insert(key.to_string(), entry);
    }

    /// 注册所有错误消息翻译
    pub fn register_all_translations() {
        let mut translations = HashMap::new();

        // 适配器加载失败
        Self::insert(
            &mut translations,
            "error.adapter_load",
            "请安装 {adapter} 适配器：通过 rat_multidb::register_adapter 注册 \"{adapter}\" 的连接池工厂 ({message})",
            "Please install the {adapter} adapter: register a pool factory for \"{adapter}\" with rat_multidb::register_adapter ({message})",
            "{adapter} アダプタをインストールしてください: rat_multidb::register_adapter で \"{adapter}\" のプールファクトリを登録してください ({message})",
        );

        // 角色未找到
        Self::insert(
            &mut translations,
            "error.unknown_role",
            "不存在的数据库连接角色 '{role}'",
            "No such database connection '{role}'",
            "データベース接続ロール '{role}' が存在しません",
        );

        // 未配置默认连接
        Self::insert(
            &mut translations,
            "error.no_default",
            "未配置默认数据库连接，且当前不在任何连接作用域内",
            "No default database connection configured and no active connection scope",
            "デフォルトのデータベース接続が設定されておらず、接続スコープ外です",
        );

        // 数据库连接错误
        Self::insert(
            &mut translations,
            "error.connection",
            "数据库连接失败: {message}",
            "Database connection failed: {message}",
            "データベース接続に失敗しました: {message}",
        );

        // 连接池错误
        Self::insert(
            &mut translations,
            "error.pool",
            "连接池操作失败: {message}",
            "Connection pool operation failed: {message}",
            "接続プール操作が失敗しました: {message}",
        );

        // 配置错误
        Self::insert(
            &mut translations,
            "error.config",
            "配置错误: {message}",
            "Configuration error: {message}",
            "設定エラー: {message}",
        );

        // 序列化错误
        Self::insert(
            &mut translations,
            "error.serialization",
            "数据序列化失败: {message}",
            "Data serialization failed: {message}",
            "データシリアライズが失敗しました: {message}",
        );

        // 配置缺少适配器
        Self::insert(
            &mut translations,
            "error.missing_adapter",
            "角色 '{role}' 的配置缺少 adapter 字段",
            "Configuration for role '{role}' has no adapter",
            "ロール '{role}' の設定に adapter がありません",
        );

        // 全局均衡器已创建
        Self::insert(
            &mut translations,
            "error.already_configured",
            "全局均衡器已创建，请先调用 disconnect_all 再重新配置",
            "The global balancer is already built; call disconnect_all before reconfiguring",
            "グローバルバランサーは作成済みです。再設定の前に disconnect_all を呼び出してください",
        );

        // 不在任何上下文内
        Self::insert(
            &mut translations,
            "error.no_context",
            "当前任务不在连接上下文内，请用 context::root 或 use_with 包裹后再切换当前连接",
            "The current task has no connection context; wrap it with context::root or use_with before switching the current connection",
            "現在のタスクに接続コンテキストがありません。現在の接続を切り替える前に context::root または use_with で囲んでください",
        );

        // 获取连接超时
        Self::insert(
            &mut translations,
            "error.checkout_timeout",
            "从连接池 '{role}' 获取连接超时 ({seconds}秒)",
            "Timed out after {seconds}s waiting for a connection from pool '{role}'",
            "接続プール '{role}' からの接続取得がタイムアウトしました ({seconds}秒)",
        );

        // 配置文件解析
        Self::insert(
            &mut translations,
            "error.config_parse",
            "解析{format}配置文件失败: {message}",
            "Failed to parse {format} configuration file: {message}",
            "{format}設定ファイルの解析に失敗しました: {message}",
        );

        Self::insert(
            &mut translations,
            "error.config_serialize",
            "序列化{format}配置失败: {message}",
            "Failed to serialize {format} configuration: {message}",
            "{format}設定のシリアライズに失敗しました: {message}",
        );

        // 注册所有翻译
        register_translations(translations);
    }

    /// 初始化错误消息多语言支持
    pub fn init() {
        Self::register_all_translations();

        // 从环境变量获取语言设置，默认为zh-CN
        let lang = std::env::var("RAT_LANG")
            .or_else(|_| std::env::var("LANG"))
            .unwrap_or_else(|_| "zh-CN".to_string());

        // 标准化语言代码
        use rat_embed_lang::normalize_language_code;
        let normalized_lang = normalize_language_code(&lang);
        set_language(&normalized_lang);
    }
}

/// 重新导出rat_embed_lang的核心函数
pub use rat_embed_lang::{t, tf, set_language, current_language};
