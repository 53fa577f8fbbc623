use crate::error::Result;
use crate::runtime::Holder;

use super::ScenarioDriver;

pub(super) fn strong_reference_sharing(driver: &mut ScenarioDriver) -> Result<()> {
    let heap = driver.heap_mut();
    let dev = heap.create("Dummy Dev");
    heap.set_strong(Holder::root("reference1"), dev)?;
    heap.set_strong(Holder::root("reference2"), dev)?;
    heap.set_strong(Holder::root("reference3"), dev)?;

    heap.clear_strong(&Holder::root("reference1"))?;
    heap.clear_strong(&Holder::root("reference2"))?;
    let live = heap.is_live(dev)?;
    let count = heap.strong_count(dev)?;
    driver.note(format!(
        "after clearing reference1 and reference2: live={}, strong count={}",
        live, count
    ));

    driver.heap_mut().clear_strong(&Holder::root("reference3"))?;
    Ok(())
}

pub(super) fn strong_cycle(driver: &mut ScenarioDriver) -> Result<()> {
    let heap = driver.heap_mut();
    let dev = heap.create("Dev 1");
    let tech = heap.create("Swift");
    heap.set_strong(Holder::root("dev1"), dev)?;
    heap.set_strong(Holder::root("tech1"), tech)?;

    heap.set_strong(Holder::field(dev, "language"), tech)?;
    heap.set_strong(Holder::field(tech, "dev"), dev)?;

    heap.clear_strong(&Holder::root("dev1"))?;
    heap.clear_strong(&Holder::root("tech1"))?;
    let counts = (heap.strong_count(dev)?, heap.strong_count(tech)?);
    driver.note(format!(
        "roots cleared: Dev 1 strong count={}, Swift strong count={}",
        counts.0, counts.1
    ));
    Ok(())
}

pub(super) fn broken_cycle_via_weak(driver: &mut ScenarioDriver) -> Result<()> {
    let heap = driver.heap_mut();
    let dev = heap.create("Dev 1");
    let tech = heap.create("Swift");
    heap.set_strong(Holder::root("dev1"), dev)?;
    heap.set_strong(Holder::root("tech1"), tech)?;

    heap.set_strong(Holder::field(dev, "languageNew"), tech)?;
    heap.set_weak(Holder::field(tech, "dev"), dev)?;

    heap.clear_strong(&Holder::root("dev1"))?;
    let back = heap.read(&Holder::field(tech, "dev"))?;
    driver.note(format!(
        "after clearing dev1: Swift.dev is {}",
        if back.is_some() { "set" } else { "nil" }
    ));

    driver.heap_mut().clear_strong(&Holder::root("tech1"))?;
    Ok(())
}

pub(super) fn unowned_valid(driver: &mut ScenarioDriver) -> Result<()> {
    let heap = driver.heap_mut();
    let car = heap.create("Car Mercedes");
    heap.set_strong(Holder::root("car1"), car)?;

    let model = heap.create("ModelNumber #123456");
    heap.set_unowned(Holder::field(model, "car"), car)?;
    heap.set_strong(Holder::field(car, "modelNumber"), model)?;

    let owner = heap.read(&Holder::field(model, "car"))?;
    if let Some(owner) = owner {
        let label = heap.label(owner)?.to_string();
        driver.note(format!("ModelNumber #123456 belongs to {}", label));
    }

    driver.heap_mut().clear_strong(&Holder::root("car1"))?;
    Ok(())
}

pub(super) fn unowned_dangling_access(driver: &mut ScenarioDriver) -> Result<()> {
    let heap = driver.heap_mut();
    let car = heap.create("Car Mercedes");
    let model = heap.create("ModelNumber #123456");
    heap.set_strong(Holder::root("car1"), car)?;
    heap.set_strong(Holder::root("model1"), model)?;

    heap.set_unowned(Holder::field(model, "car"), car)?;
    heap.set_strong(Holder::field(car, "modelNumber"), model)?;

    heap.clear_strong(&Holder::root("car1"))?;
    driver.note("car1 cleared while model1 still holds the model number");

    driver.heap_mut().read(&Holder::field(model, "car"))?;
    Ok(())
}

pub(super) fn unowned_optional_chain(driver: &mut ScenarioDriver) -> Result<()> {
    let heap = driver.heap_mut();
    let department = heap.create("Department Horticulture");
    heap.set_strong(Holder::root("department"), department)?;

    let titles = [
        ("intro", "Course Survey of Plants"),
        ("intermediate", "Course Growing Common Herbs"),
        ("advanced", "Course Caring for Tropical Plants"),
    ];
    let mut courses = Vec::with_capacity(titles.len());
    for (variable, title) in titles {
        let course = heap.create(title);
        heap.set_strong(Holder::root(variable), course)?;
        heap.set_unowned(Holder::field(course, "department"), department)?;
        courses.push(course);
    }

    for pair in courses.windows(2) {
        heap.set_unowned(Holder::field(pair[0], "nextCourse"), pair[1])?;
    }
    for (index, course) in courses.iter().enumerate() {
        heap.set_strong(Holder::field(department, format!("courses[{}]", index)), *course)?;
    }

    let mut walk = Vec::new();
    let mut cursor = courses.first().copied();
    while let Some(course) = cursor {
        walk.push(heap.label(course)?.to_string());
        cursor = heap.read(&Holder::field(course, "nextCourse"))?;
    }
    driver.note(format!("course order: {}", walk.join(" -> ")));
    Ok(())
}

pub(super) fn strong_self_capture(driver: &mut ScenarioDriver) -> Result<()> {
    publish_later(driver, "Blog Correct", Capture::Strong)
}

pub(super) fn weak_self_capture(driver: &mut ScenarioDriver) -> Result<()> {
    publish_later(driver, "Blog Wrong", Capture::Weak)
}

#[derive(Clone, Copy)]
enum Capture {
    Strong,
    Weak,
}

/// A blog and its blogger refer to each other (blog side weak), then a closure capturing the
/// blog is queued. Both roots are dropped before the queue runs the closure.
fn publish_later(driver: &mut ScenarioDriver, blog_label: &str, capture: Capture) -> Result<()> {
    let heap = driver.heap_mut();
    let blog = heap.create(blog_label);
    let blogger = heap.create("Blogger Some Blogger");
    heap.set_strong(Holder::root("blog"), blog)?;
    heap.set_strong(Holder::root("blogger"), blogger)?;
    heap.set_weak(Holder::field(blog, "owner"), blogger)?;
    heap.set_strong(Holder::field(blogger, "blog"), blog)?;

    let closure = heap.create("publish closure");
    heap.set_strong(Holder::root("mainQueue"), closure)?;
    match capture {
        Capture::Strong => heap.set_strong(Holder::field(closure, "self"), blog)?,
        Capture::Weak => heap.set_weak(Holder::field(closure, "self"), blog)?,
    }

    heap.clear_strong(&Holder::root("blog"))?;
    heap.clear_strong(&Holder::root("blogger"))?;

    let target = heap.read(&Holder::field(closure, "self"))?;
    driver.note(match target {
        Some(_) => "Published post count is now: 1",
        None => "Published post count is now: nil",
    });

    driver.heap_mut().clear_strong(&Holder::root("mainQueue"))?;
    Ok(())
}
