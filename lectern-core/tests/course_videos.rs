mod support;

use lectern_core::{
    LecternError, RequestContext,
    model::{
        CourseFilter, CourseID, CoursePatch, NewCourse, NewVideo, PageRequest, Role,
        VideoPatch,
    },
    ordering::is_dense,
};
use support::Harness;

#[tokio::test]
async fn authoring_a_course() {
    let harness = Harness::new();
    let (lecturer, ctx) = harness.sign_up("lena", Role::Lecturer).await;
    let courses = &harness.services.courses;
    let videos = &harness.services.videos;

    let course = courses
        .create(&ctx, &NewCourse::new("Ownership in practice"))
        .await
        .unwrap();
    assert_eq!(course.audit.created_by, Some(lecturer.id));
    assert_eq!(course.audit.updated_at, None);
    assert!(!course.audit.is_deleted);

    for title in ["Borrowing", "Lifetimes", "Smart pointers"] {
        videos
            .create(&ctx, course.id, &NewVideo::new(title))
            .await
            .unwrap();
    }

    let detail = courses.get(course.id).await.unwrap();
    let titles: Vec<_> =
        detail.videos.iter().map(|v| v.title.as_str()).collect();
    assert_eq!(titles, ["Borrowing", "Lifetimes", "Smart pointers"]);
    assert!(is_dense(detail.videos.iter().map(|v| v.order)));

    let last = detail.videos[2].id;
    let moved = videos.reorder(&ctx, last, 0).await.unwrap();
    assert_eq!(moved.order, 0);
    assert_eq!(moved.audit.updated_by, Some(lecturer.id));

    let page = videos
        .list_by_course(course.id, PageRequest::new(1, 2).unwrap())
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items[0].title, "Smart pointers");
    assert_eq!(page.items[1].title, "Borrowing");
}

#[tokio::test]
async fn only_the_author_may_change_a_course() {
    let harness = Harness::new();
    let (_, author) = harness.sign_up("author", Role::Lecturer).await;
    let (_, other) = harness.sign_up("other", Role::Lecturer).await;
    let courses = &harness.services.courses;
    let videos = &harness.services.videos;

    let course = courses
        .create(&author, &NewCourse::new("Async Rust"))
        .await
        .unwrap();
    let video = videos
        .create(&author, course.id, &NewVideo::new("Futures"))
        .await
        .unwrap();

    let patch = CoursePatch {
        title: Some("Hijacked".into()),
        ..CoursePatch::default()
    };
    assert!(matches!(
        courses.update(&other, course.id, &patch).await,
        Err(LecternError::Forbidden(_))
    ));
    assert!(matches!(
        videos
            .create(&other, course.id, &NewVideo::new("Spam"))
            .await,
        Err(LecternError::Forbidden(_))
    ));
    assert!(matches!(
        videos.reorder(&other, video.id, 0).await,
        Err(LecternError::Forbidden(_))
    ));
    assert!(matches!(
        videos
            .update(&other, video.id, &VideoPatch::default())
            .await,
        Err(LecternError::Forbidden(_))
    ));
    assert!(matches!(
        courses
            .create(&RequestContext::anonymous(), &NewCourse::new("x"))
            .await,
        Err(LecternError::Unauthenticated(_))
    ));
    assert!(matches!(
        courses.delete(&author, lectern_core::model::CourseID::new()).await,
        Err(LecternError::NotFound(_))
    ));
}

#[tokio::test]
async fn deleted_courses_and_videos_disappear_from_reads() {
    let harness = Harness::new();
    let (author_user, author) = harness.sign_up("author", Role::Lecturer).await;
    let courses = &harness.services.courses;
    let videos = &harness.services.videos;

    let keep = courses
        .create(&author, &NewCourse::new("Keep"))
        .await
        .unwrap();
    let dropped = courses
        .create(&author, &NewCourse::new("Drop"))
        .await
        .unwrap();
    let a = videos
        .create(&author, keep.id, &NewVideo::new("a"))
        .await
        .unwrap();
    let b = videos
        .create(&author, keep.id, &NewVideo::new("b"))
        .await
        .unwrap();

    courses.delete(&author, dropped.id).await.unwrap();
    let listed = courses
        .list(&CourseFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(listed.items[0].id, keep.id);
    assert!(matches!(
        courses.get(dropped.id).await,
        Err(LecternError::NotFound(_))
    ));

    videos.delete(&author, a.id).await.unwrap();
    assert!(matches!(
        videos.get(a.id).await,
        Err(LecternError::NotFound(_))
    ));
    let kept = videos.get_including_deleted(a.id).await.unwrap();
    assert!(kept.audit.is_deleted);
    assert_eq!(kept.audit.deleted_by, Some(author_user.id));
    assert_eq!(kept.audit.created_at, a.audit.created_at);

    let b_now = videos.get(b.id).await.unwrap();
    assert_eq!(b_now.order, 0);
}

#[tokio::test]
async fn videos_of_a_deleted_course_are_gone() {
    let harness = Harness::new();
    let (_, author) = harness.sign_up("author", Role::Lecturer).await;
    let courses = &harness.services.courses;
    let videos = &harness.services.videos;

    let course = courses
        .create(&author, &NewCourse::new("Retired"))
        .await
        .unwrap();
    let first = videos
        .create(&author, course.id, &NewVideo::new("first"))
        .await
        .unwrap();
    let second = videos
        .create(&author, course.id, &NewVideo::new("second"))
        .await
        .unwrap();
    courses.delete(&author, course.id).await.unwrap();

    assert!(matches!(
        videos.get(first.id).await,
        Err(LecternError::NotFound(_))
    ));
    assert!(matches!(
        videos.list_by_course(course.id, PageRequest::default()).await,
        Err(LecternError::NotFound(_))
    ));
    assert!(matches!(
        videos.reorder(&author, second.id, 0).await,
        Err(LecternError::NotFound(_))
    ));
    assert!(matches!(
        videos.delete(&author, first.id).await,
        Err(LecternError::NotFound(_))
    ));
    assert!(matches!(
        videos
            .list_by_course(CourseID::new(), PageRequest::default())
            .await,
        Err(LecternError::NotFound(_))
    ));

    let audit_view = videos.get_including_deleted(second.id).await.unwrap();
    assert_eq!(audit_view.order, 1);
    assert!(!audit_view.audit.is_deleted);
}

#[tokio::test]
async fn optional_fields_can_be_cleared() {
    let harness = Harness::new();
    let (_, author) = harness.sign_up("author", Role::Lecturer).await;
    let courses = &harness.services.courses;
    let videos = &harness.services.videos;

    let course = courses
        .create(&author, &NewCourse::new("Macros"))
        .await
        .unwrap();
    let described = courses
        .update(
            &author,
            course.id,
            &CoursePatch {
                description: Some(Some("macro_rules! and friends".into())),
                ..CoursePatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(
        described.description.as_deref(),
        Some("macro_rules! and friends")
    );

    let renamed = courses
        .update(
            &author,
            course.id,
            &CoursePatch {
                title: Some("Declarative macros".into()),
                ..CoursePatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.description, described.description);

    let cleared = courses
        .update(
            &author,
            course.id,
            &CoursePatch {
                description: Some(None),
                ..CoursePatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.description, None);
    assert_eq!(cleared.title, "Declarative macros");

    let video = videos
        .create(&author, course.id, &NewVideo::new("Hygiene"))
        .await
        .unwrap();
    let hosted = videos
        .update(
            &author,
            video.id,
            &VideoPatch {
                url: Some(Some("https://cdn.example.edu/hygiene.mp4".into())),
                size: Some(Some(2048)),
                ..VideoPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(hosted.size, Some(2048));

    let unhosted = videos
        .update(
            &author,
            video.id,
            &VideoPatch {
                url: Some(None),
                ..VideoPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(unhosted.url, None);
    assert_eq!(unhosted.size, Some(2048));
}

#[tokio::test]
async fn invalid_reorder_targets() {
    let harness = Harness::new();
    let (_, ctx) = harness.sign_up("author", Role::Lecturer).await;
    let course = harness
        .services
        .courses
        .create(&ctx, &NewCourse::new("C"))
        .await
        .unwrap();
    let video = harness
        .services
        .videos
        .create(&ctx, course.id, &NewVideo::new("only"))
        .await
        .unwrap();

    for bad in [-1, 1, 99] {
        assert!(matches!(
            harness.services.videos.reorder(&ctx, video.id, bad).await,
            Err(LecternError::InvalidArgument(_))
        ));
    }
    let same = harness
        .services
        .videos
        .reorder(&ctx, video.id, 0)
        .await
        .unwrap();
    assert_eq!(same, video);
}
