//! UI strings for the public site and the dashboard.

use crate::locale::Lang;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    SiteTitle,
    LatestPosts,
    NoPosts,
    OlderPosts,
    NewerPosts,
    Comments,
    NoComments,
    NotFound,
    BackHome,
    Posts,
    Users,
    Media,
    Moderation,
    LoadMore,
    Loading,
    TryAgain,
    SignIn,
    SignOut,
    Publish,
    Unpublish,
    Delete,
    Edit,
    Save,
    Cancel,
    NewPost,
    Title,
    Content,
    Tags,
    Draft,
    Search,
    Thumbnail,
    Upload,
    AccessToken,
    AdminOnly,
    ChiefOnly,
    AllComments,
    Empty,
}

pub fn t(lang: Lang, key: Key) -> &'static str {
    match lang {
        Lang::En => en(key),
        Lang::Cn => cn(key),
    }
}

fn en(key: Key) -> &'static str {
    match key {
        Key::SiteTitle => "Quill",
        Key::LatestPosts => "Latest posts",
        Key::NoPosts => "Nothing published yet.",
        Key::OlderPosts => "Older posts",
        Key::NewerPosts => "Newer posts",
        Key::Comments => "Comments",
        Key::NoComments => "No comments yet.",
        Key::NotFound => "Page not found",
        Key::BackHome => "Back to the front page",
        Key::Posts => "Posts",
        Key::Users => "Users",
        Key::Media => "Media",
        Key::Moderation => "Moderation",
        Key::LoadMore => "Load more",
        Key::Loading => "Loading...",
        Key::TryAgain => "Try again",
        Key::SignIn => "Sign in",
        Key::SignOut => "Sign out",
        Key::Publish => "Publish",
        Key::Unpublish => "Unpublish",
        Key::Delete => "Delete",
        Key::Edit => "Edit",
        Key::Save => "Save",
        Key::Cancel => "Cancel",
        Key::NewPost => "New post",
        Key::Title => "Title",
        Key::Content => "Content",
        Key::Tags => "Tags (comma separated)",
        Key::Draft => "draft",
        Key::Search => "Search",
        Key::Thumbnail => "Thumbnail media id",
        Key::Upload => "Upload",
        Key::AccessToken => "Access token",
        Key::AdminOnly => "The dashboard is for administrators.",
        Key::ChiefOnly => "Chief only",
        Key::AllComments => "All comments",
        Key::Empty => "Nothing here yet.",
    }
}

fn cn(key: Key) -> &'static str {
    match key {
        Key::SiteTitle => "Quill",
        Key::LatestPosts => "最新文章",
        Key::NoPosts => "还没有发布任何文章。",
        Key::OlderPosts => "更早的文章",
        Key::NewerPosts => "较新的文章",
        Key::Comments => "评论",
        Key::NoComments => "暂无评论。",
        Key::NotFound => "页面不存在",
        Key::BackHome => "返回首页",
        Key::Posts => "文章",
        Key::Users => "用户",
        Key::Media => "媒体",
        Key::Moderation => "评论审核",
        Key::LoadMore => "加载更多",
        Key::Loading => "加载中...",
        Key::TryAgain => "重试",
        Key::SignIn => "登录",
        Key::SignOut => "退出",
        Key::Publish => "发布",
        Key::Unpublish => "撤回",
        Key::Delete => "删除",
        Key::Edit => "编辑",
        Key::Save => "保存",
        Key::Cancel => "取消",
        Key::NewPost => "新建文章",
        Key::Title => "标题",
        Key::Content => "内容",
        Key::Tags => "标签（逗号分隔）",
        Key::Draft => "草稿",
        Key::Search => "搜索",
        Key::Thumbnail => "缩略图媒体编号",
        Key::Upload => "上传",
        Key::AccessToken => "访问令牌",
        Key::AdminOnly => "仪表盘仅对管理员开放。",
        Key::ChiefOnly => "仅精选评论",
        Key::AllComments => "全部评论",
        Key::Empty => "这里还没有内容。",
    }
}
