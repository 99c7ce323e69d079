pub(super) const ROOT_LONG_ABOUT: &str = "\
Verify and maintain per-directory md5 checksum files

Checktree walks each given directory recursively. Every directory that
contains files gets its own checksum file named after the directory
(photos/photos.md5) listing the md5 of each file directly inside it, in
the format written by md5sum. Subdirectories are described by their own
checksum files, so a directory can be moved or copied together with its
checksum file and still be verified on its own.

For each directory the files are hashed and compared with the checksum
file. Differences fall into four categories:

  updated   a listed file whose checksum changed
  renamed   a listed file that disappeared while an unlisted file with
            the same checksum appeared
  new       a file that is not listed
  deleted   a listed file that disappeared

What happens for each category is decided by its policy (see below).
The checksum file is rewritten with the current state of the directory
when a policy asks for it and, for prompting policies, after you answer
'y' to the confirmation question.

Each directory is printed with a tag:

  [EMPTY]   no files, nothing to check
  [VERIFY]  compared with its checksum file
  [NOFILE]  no checksum file; skipped or created after confirmation
  [CREATE]  no checksum file; one is created

A summary with the amount of data processed and the average rate is
printed at the end. Pressing Ctrl-C cancels the run, prints the summary
so far and leaves every checksum file either in its old or its new
state.

EXAMPLES:

  Create or refresh checksum files, asking before each change:
    $ checktree ~/photos

  Check a backup without touching anything:
    $ checktree --verify-all /mnt/backup/photos

  Record everything unattended, but never accept changed checksums:
    $ checktree --autoupdate-all ~/music
    $ checktree -m create -r autoupdate -n autoupdate -d autoupdate -u fail ~/music

  Use the system md5sum instead of the built-in hasher:
    $ checktree --hash-program md5sum ~/photos";

pub(super) const POLICY_HELP: &str = "\
POLICIES:

  Renamed, new, deleted and updated files take one of:

    ignore      do nothing and print nothing
    show        print the files, keep the checksum file as it is
    autoupdate  print the files and rewrite the checksum file
    prompt      print the files and ask before rewriting
    fail        print the files and stop with an error

  A directory without a checksum file (--missing) takes one of:

    ignore      create a checksum file, asking first (default)
    skip        print the directory and move on
    show        print the directory and move on
    create      create a checksum file without asking
    prompt      create a checksum file after asking
    fail        stop with an error

  In a directory without a checksum file every file is new; the --new
  policy does not apply there.

PRESETS:

  Presets replace all five policies (renames, missing, new, deletes,
  updates). When several are given the last one in this list wins.

    -A, --autoupdate-all  autoupdate, create, autoupdate, autoupdate, autoupdate
    -V, --verify-all      show, show, show, show, show
    -R, --refresh-all     autoupdate, create, autoupdate, prompt, prompt
    -U, --update-all      prompt, create, prompt, prompt, prompt
    -P, --prompt-all      prompt, prompt, prompt, prompt, prompt

  The policy in effect is printed at the start of every run.

EXIT CODES:

  0  all directories processed, or cancelled with Ctrl-C
  1  a fail policy triggered or an error occurred

LOGGING:

  Diagnostics go to stderr. Use -v for info, -vv for debug, or
  --log-level. RUST_LOG is honored when neither is given.";
