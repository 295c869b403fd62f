use super::*;

fn group(role: GroupRole) -> SceneGroup {
    SceneGroup::new(role)
}

#[test]
fn ordered_groups_follow_paint_layers_and_keep_ties_stable() {
    let mut scene = Scene::new(Size::new(100.0, 100.0), Color::WHITE);
    scene.push(group(GroupRole::Title));
    scene.push(group(GroupRole::Mark(MarkType::Bar)).at(Vec2::new(1.0, 0.0)));
    scene.push(group(GroupRole::Grid));
    scene.push(group(GroupRole::Mark(MarkType::Bar)).at(Vec2::new(2.0, 0.0)));
    scene.push(group(GroupRole::Legend));
    scene.push(group(GroupRole::Axis));
    scene.push(group(GroupRole::Background));

    let order: Vec<GroupRole> = scene.ordered_groups().iter().map(|g| g.role).collect();
    assert_eq!(
        order,
        [
            GroupRole::Background,
            GroupRole::Grid,
            GroupRole::Axis,
            GroupRole::Mark(MarkType::Bar),
            GroupRole::Mark(MarkType::Bar),
            GroupRole::Legend,
            GroupRole::Title,
        ]
    );
    let marks: Vec<f64> = scene
        .ordered_groups()
        .iter()
        .filter(|g| matches!(g.role, GroupRole::Mark(_)))
        .map(|g| g.transform.translation().x)
        .collect();
    assert_eq!(marks, [1.0, 2.0]);
    assert_eq!(scene.mark_count(), 2);
}

#[test]
fn place_offsets_child_groups() {
    let mut child = Scene::new(Size::new(10.0, 10.0), Color::WHITE);
    child.push(group(GroupRole::Mark(MarkType::Point)).at(Vec2::new(5.0, 5.0)));
    let mut parent = Scene::new(Size::new(100.0, 100.0), Color::WHITE);
    parent.place(child, Vec2::new(20.0, 30.0));
    assert_eq!(
        parent.groups()[0].transform.translation(),
        Vec2::new(25.0, 35.0)
    );
}

#[test]
fn mark_groups_carry_their_type_in_the_class() {
    assert_eq!(
        GroupRole::Mark(MarkType::Boxplot).class_name(),
        "mark mark-boxplot"
    );
    assert!(GroupRole::Title.layer() > GroupRole::Legend.layer());
}
