use crate::http_error::AppError;
use crate::plugins::blogs::models::{
    BlogChanges, BlogDto, BlogFilter, BlogWithUser, CreateBlogInput, GetBlogsQuery, NewBlog, UpdateBlogInput,
};
use crate::plugins::blogs::repo::DynBlogRepo;
use crate::plugins::blogs::slug::generate_slug;
use crate::plugins::shared::{MessageResponse, PageMeta, Paginated};
use crate::services::storage::{DynStorage, UploadedFile};

const TITLE_USED: &str = "Title already used";
const BLOG_NOT_FOUND: &str = "Blog not found";

pub struct BlogService {
    blogs: DynBlogRepo,
    storage: DynStorage,
}

impl BlogService {
    pub fn new(blogs: DynBlogRepo, storage: DynStorage) -> Self {
        Self { blogs, storage }
    }

    async fn list(&self, filter: BlogFilter) -> Result<Paginated<BlogWithUser>, AppError> {
        let (data, total) = self.blogs.list(&filter).await?;
        Ok(Paginated { data, meta: PageMeta { page: filter.page, take: filter.take, total } })
    }

    pub async fn get_blogs(&self, query: GetBlogsQuery) -> Result<Paginated<BlogWithUser>, AppError> {
        self.list(BlogFilter::from_query(query, None)).await
    }

    pub async fn get_blogs_by_user_id(&self, user_id: i64, query: GetBlogsQuery) -> Result<Paginated<BlogWithUser>, AppError> {
        self.list(BlogFilter::from_query(query, Some(user_id))).await
    }

    pub async fn get_blog_by_slug(&self, slug: &str) -> Result<BlogWithUser, AppError> {
        self.blogs
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::not_found(BLOG_NOT_FOUND))
    }

    /// Removes an asset no row points at any more. Failure leaves an orphaned file,
    /// never a broken row, so it is only logged.
    async fn discard_asset(&self, url: &str) {
        if let Err(e) = self.storage.remove(url).await {
            tracing::warn!(%url, "failed to remove thumbnail: {e:#}");
        }
    }

    /// Live blog owned by `auth_user_id`, or the matching 404/403.
    async fn find_owned(&self, id: i64, auth_user_id: i64) -> Result<BlogDto, AppError> {
        let blog = self
            .blogs
            .find_by_id(id)
            .await?
            .filter(|b| b.deleted_at.is_none())
            .ok_or_else(|| AppError::not_found(BLOG_NOT_FOUND))?;
        if blog.user_id != auth_user_id {
            return Err(AppError::forbidden("Forbidden"));
        }
        Ok(blog)
    }

    pub async fn create_blog(
        &self,
        body: CreateBlogInput,
        thumbnail: UploadedFile,
        auth_user_id: i64,
    ) -> Result<BlogDto, AppError> {
        if self.blogs.title_taken(&body.title, None).await? {
            return Err(AppError::bad_request(TITLE_USED));
        }

        let slug = generate_slug(&body.title);
        let thumbnail_url = self.storage.upload(&thumbnail).await?;

        let inserted = self
            .blogs
            .insert(NewBlog {
                title: body.title,
                slug,
                description: body.description,
                content: body.content,
                category: body.category,
                thumbnail: thumbnail_url.clone(),
                user_id: auth_user_id,
            })
            .await;
        let blog = match inserted {
            Ok(blog) => blog,
            Err(e) => {
                self.discard_asset(&thumbnail_url).await;
                return Err(e);
            }
        };
        tracing::info!(blog_id = blog.id, user_id = auth_user_id, "blog created");
        Ok(blog)
    }

    pub async fn update_blog(
        &self,
        id: i64,
        body: UpdateBlogInput,
        auth_user_id: i64,
        thumbnail: Option<UploadedFile>,
    ) -> Result<BlogDto, AppError> {
        let blog = self.find_owned(id, auth_user_id).await?;

        let mut changes = BlogChanges {
            description: body.description,
            content: body.content,
            category: body.category,
            ..BlogChanges::default()
        };

        if let Some(title) = body.title.filter(|t| *t != blog.title) {
            if self.blogs.title_taken(&title, Some(blog.id)).await? {
                return Err(AppError::bad_request(TITLE_USED));
            }
            changes.slug = Some(generate_slug(&title));
            changes.title = Some(title);
        }

        let new_thumbnail = match thumbnail {
            Some(file) => Some(self.storage.upload(&file).await?),
            None => None,
        };
        changes.thumbnail = new_thumbnail.clone();

        match self.blogs.update(blog.id, changes).await {
            Ok(updated) => {
                if new_thumbnail.is_some() {
                    self.discard_asset(&blog.thumbnail).await;
                }
                Ok(updated)
            }
            Err(e) => {
                if let Some(url) = &new_thumbnail {
                    self.discard_asset(url).await;
                }
                Err(e)
            }
        }
    }

    pub async fn delete_blog(&self, id: i64, auth_user_id: i64) -> Result<MessageResponse, AppError> {
        let blog = self.find_owned(id, auth_user_id).await?;
        self.storage.remove(&blog.thumbnail).await?;
        self.blogs.soft_delete(blog.id).await?;
        tracing::info!(blog_id = blog.id, user_id = auth_user_id, "blog soft-deleted");
        Ok(MessageResponse::new("Delete blog success"))
    }
}
