fn main() -> anyhow::Result<()> {
    warung_pos::run()
}
